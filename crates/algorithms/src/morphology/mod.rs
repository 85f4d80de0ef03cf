//! Mathematical morphology on elevation rasters
//!
//! - **Erosion**: windowed minimum
//! - **Dilation**: windowed maximum over the mirrored window
//! - **Opening**: erosion then dilation, the bare-earth estimator
//!
//! All operators use a square [`SquareWindow`], clip the window at the
//! raster edge and skip no-data cells.

mod dilate;
mod erode;
mod filter;
mod opening;
mod window;

pub use dilate::dilate;
pub use erode::erode;
pub use opening::{opening, Opening, OpeningParams};
pub use window::SquareWindow;
