//! Canopy height model
//!
//! Height of vegetation above the approximated ground:
//! `chm = dsm - dtm`, cell by cell.

use ndarray::Zip;
use serde::{Deserialize, Serialize};
use standgis_core::raster::Raster;
use standgis_core::{Algorithm, Error, Result};
use tracing::debug;

/// Parameters for the canopy height model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanopyParams {
    /// Floor negative heights at 0. Off by default: the difference is
    /// written as computed.
    pub clamp_negative: bool,
}

/// Canopy height algorithm
#[derive(Debug, Clone, Default)]
pub struct CanopyHeight;

impl Algorithm for CanopyHeight {
    /// (surface, terrain)
    type Input = (Raster<f64>, Raster<f64>);
    type Output = Raster<f64>;
    type Params = CanopyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CanopyHeight"
    }

    fn description(&self) -> &'static str {
        "Canopy height as surface minus approximated terrain"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        canopy_height(&input.0, &input.1, &params)
    }
}

/// Subtract the terrain from the surface model
///
/// No-data in either input gives NaN in the output.
///
/// # Errors
/// `ShapeMismatch` if the two rasters differ in shape, transform or CRS.
pub fn canopy_height(
    surface: &Raster<f64>,
    terrain: &Raster<f64>,
    params: &CanopyParams,
) -> Result<Raster<f64>> {
    surface.ensure_same_grid(terrain)?;

    debug!(clamp = params.clamp_negative, "computing canopy height");

    let mut output = surface.with_same_meta::<f64>();
    output.set_nodata(Some(f64::NAN));

    Zip::from(output.data_mut())
        .and(surface.data())
        .and(terrain.data())
        .for_each(|out, &s, &t| {
            *out = if surface.is_nodata(s) || terrain.is_nodata(t) {
                f64::NAN
            } else if params.clamp_negative {
                (s - t).max(0.0)
            } else {
                s - t
            };
        });

    Ok(output)
}
