//! Bare-earth terrain approximation
//!
//! Estimates a digital terrain model from a surface model by grayscale
//! morphological opening: canopy and buildings narrower than the window
//! are cut away, the ground surface below them is kept.

use serde::{Deserialize, Serialize};
use standgis_core::raster::Raster;
use standgis_core::{Algorithm, Error, Result};
use tracing::debug;

use crate::morphology::{opening, SquareWindow};

/// Parameters for terrain approximation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainParams {
    /// Side of the square window in cells. Should exceed the width of the
    /// largest above-ground object at the raster resolution.
    pub window_size: usize,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self { window_size: 15 }
    }
}

/// Terrain approximation algorithm
#[derive(Debug, Clone, Default)]
pub struct TerrainApproximation;

impl Algorithm for TerrainApproximation {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = TerrainParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TerrainApproximation"
    }

    fn description(&self) -> &'static str {
        "Approximate bare-earth terrain from a surface model by morphological opening"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        approximate_terrain(&input, &params)
    }
}

/// Approximate the bare-earth terrain under a surface model
///
/// The output shares the input grid (shape, transform, CRS), holds NaN
/// where the input is no-data, and is never above the input.
///
/// # Errors
/// `InvalidWindow` when the window is 0 or larger than either raster
/// dimension; nothing is computed in that case.
pub fn approximate_terrain(surface: &Raster<f64>, params: &TerrainParams) -> Result<Raster<f64>> {
    let window = SquareWindow::new(params.window_size);
    window.validate_for(surface.rows(), surface.cols())?;

    debug!(
        rows = surface.rows(),
        cols = surface.cols(),
        window = params.window_size,
        "approximating terrain"
    );

    opening(surface, &window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use standgis_core::{GeoTransform, CRS};

    fn forest_plot() -> Raster<f64> {
        // Gentle slope with a 2x2 "tree" on it
        let mut dsm: Raster<f64> = Raster::new(12, 12)
            .with_transform(GeoTransform::new(385_000.0, 6_672_000.0, 2.0, -2.0))
            .with_crs(CRS::from_epsg(3067));
        for row in 0..12 {
            for col in 0..12 {
                dsm.set(row, col, 100.0 + col as f64 * 0.5).unwrap();
            }
        }
        for (r, c) in [(5, 5), (5, 6), (6, 5), (6, 6)] {
            dsm.set(r, c, 125.0).unwrap();
        }
        dsm
    }

    #[test]
    fn test_tree_removed() {
        let dsm = forest_plot();
        let dtm = approximate_terrain(&dsm, &TerrainParams { window_size: 5 }).unwrap();

        assert!(dsm.ensure_same_grid(&dtm).is_ok());
        let ground = dtm.get(5, 5).unwrap();
        assert!(ground < 110.0, "tree should be cut away, got {}", ground);
        for (&s, &t) in dsm.data().iter().zip(dtm.data()) {
            assert!(t <= s);
        }
    }

    #[test]
    fn test_invalid_window() {
        let dsm = forest_plot();
        for size in [0, 13] {
            let err = approximate_terrain(&dsm, &TerrainParams { window_size: size }).unwrap_err();
            assert!(matches!(err, Error::InvalidWindow { .. }));
        }
    }

    #[test]
    fn test_default_window() {
        assert_eq!(TerrainParams::default().window_size, 15);
        let dsm: Raster<f64> = Raster::filled(20, 20, 50.0);
        let dtm = TerrainApproximation.execute_default(dsm).unwrap();
        assert_eq!(dtm.get(10, 10).unwrap(), 50.0);
    }
}
