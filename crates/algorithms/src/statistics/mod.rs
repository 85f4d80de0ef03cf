//! Statistics of raster values under polygon features
//!
//! - **zonal**: per-feature aggregation by cell centre
//! - **reducer**: pluggable statistics (mean, min, max, percentiles...)

pub mod reducer;
pub mod zonal;

pub use reducer::{ZonalReducer, ZonalStatistic};
pub use zonal::{zonal_statistics, ZonalIndex, ZonalRecord, ZonalTable};
