//! Terrain products derived from a surface model
//!
//! - Terrain approximation: bare-earth DTM by morphological opening
//! - Canopy height: DSM minus the approximated DTM

mod approximation;
mod canopy;

pub use approximation::{approximate_terrain, TerrainApproximation, TerrainParams};
pub use canopy::{canopy_height, CanopyHeight, CanopyParams};
