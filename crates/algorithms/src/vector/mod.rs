//! Vector operations of the stand pipeline
//!
//! - Reprojection and CRS reconciliation of feature collections
//! - Identifier-based join of zonal statistics onto features

mod join;
mod reproject;

pub use join::{field_name, join_zonal};
pub use reproject::{reconcile_crs, reproject_collection, reproject_geometry};
