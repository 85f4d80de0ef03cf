//! Morphological opening (erosion followed by dilation)
//!
//! Removes bright features narrower than the window (trees, buildings on
//! a surface model) while keeping the broad shape underneath.

use standgis_core::raster::Raster;
use standgis_core::{Algorithm, Error, Result};

use super::dilate::dilate;
use super::erode::erode;
use super::window::SquareWindow;

/// Parameters for morphological opening
#[derive(Debug, Clone, Default)]
pub struct OpeningParams {
    /// Square window
    pub window: SquareWindow,
}

/// Opening algorithm
#[derive(Debug, Clone, Default)]
pub struct Opening;

impl Algorithm for Opening {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = OpeningParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Opening"
    }

    fn description(&self) -> &'static str {
        "Morphological opening (erosion then dilation) to remove small bright features"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        opening(&input, &params.window)
    }
}

/// Perform morphological opening on a raster
///
/// Opening = erode then dilate with the mirrored window. The result is
/// never above the input (anti-extensive) and opening it again changes
/// nothing (idempotent). No-data cells stay NaN and take no part in
/// either pass.
pub fn opening(raster: &Raster<f64>, window: &SquareWindow) -> Result<Raster<f64>> {
    let eroded = erode(raster, window)?;
    dilate(&eroded, window)
}
