//! Raster data structures and operations

mod element;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use geotransform::{CellWindow, GeoTransform};
pub use grid::{Raster, RasterStatistics};
