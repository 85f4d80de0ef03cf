//! # StandGIS Algorithms
//!
//! Terrain and canopy products from a surface model, and their per-stand
//! statistics.
//!
//! ## Modules
//!
//! - **morphology**: erosion, dilation and opening over a square window
//! - **terrain**: bare-earth approximation and canopy height
//! - **statistics**: zonal statistics over polygon features
//! - **vector**: reprojection, CRS reconciliation, joining statistics onto features
//! - **pipeline**: the full stand pipeline, in memory or file to file

pub(crate) mod maybe_rayon;

pub mod morphology;
pub mod pipeline;
pub mod statistics;
pub mod terrain;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::morphology::{dilate, erode, opening, Opening, OpeningParams, SquareWindow};
    pub use crate::pipeline::{run_pipeline, Pipeline, PipelineConfig, PipelineOutput, PipelineParams};
    pub use crate::statistics::{
        zonal_statistics, ZonalIndex, ZonalRecord, ZonalReducer, ZonalStatistic, ZonalTable,
    };
    pub use crate::terrain::{
        approximate_terrain, canopy_height, CanopyHeight, CanopyParams, TerrainApproximation,
        TerrainParams,
    };
    pub use crate::vector::{field_name, join_zonal, reconcile_crs, reproject_collection};
    pub use standgis_core::prelude::*;
}
