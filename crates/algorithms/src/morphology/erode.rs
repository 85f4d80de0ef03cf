//! Morphological erosion (minimum filter)
//!
//! Replaces each cell with the minimum valid value in its window.
//! Shrinks bright regions and enlarges dark regions.

use standgis_core::raster::Raster;
use standgis_core::Result;

use super::filter::{build_output, masked_values, rank_filter, Extremum};
use super::window::SquareWindow;

/// Perform morphological erosion on a raster
///
/// Each output cell is the minimum over the valid cells of the window
/// `[i - before, i + after]` on both axes, clipped at the raster edge
/// (equivalent to edge replication). No-data cells are ignored in the
/// comparison and come out as NaN.
///
/// # Errors
/// `InvalidWindow` if the window is empty or larger than the raster.
pub fn erode(raster: &Raster<f64>, window: &SquareWindow) -> Result<Raster<f64>> {
    window.validate_for(raster.rows(), raster.cols())?;

    let values = masked_values(raster);
    let out = rank_filter(values.view(), window.before(), window.after(), Extremum::Min)?;
    Ok(build_output(raster, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use standgis_core::GeoTransform;

    fn make_raster(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_erode_uniform() {
        let raster = make_raster(7, 7, 5.0);
        let result = erode(&raster, &SquareWindow::new(3)).unwrap();
        assert!(result.data().iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_erode_picks_minimum() {
        let mut raster = make_raster(7, 7, 10.0);
        raster.set(3, 4, 2.0).unwrap();

        let result = erode(&raster, &SquareWindow::new(3)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 2.0);
        assert_eq!(result.get(2, 5).unwrap(), 2.0);
        assert_eq!(result.get(3, 1).unwrap(), 10.0);
    }

    #[test]
    fn test_erode_edges_are_clipped() {
        let mut raster = make_raster(5, 5, 10.0);
        raster.set(0, 0, 1.0).unwrap();

        let result = erode(&raster, &SquareWindow::new(3)).unwrap();
        // Corner cells still get a value, never NaN
        assert_eq!(result.get(0, 0).unwrap(), 1.0);
        assert_eq!(result.get(1, 1).unwrap(), 1.0);
        assert_eq!(result.get(4, 4).unwrap(), 10.0);
    }

    #[test]
    fn test_erode_nodata_skipped() {
        let mut raster = make_raster(7, 7, 5.0);
        raster.set_nodata(Some(-9999.0));
        raster.set(3, 3, -9999.0).unwrap();

        let result = erode(&raster, &SquareWindow::new(3)).unwrap();
        // The sentinel never wins the minimum
        assert!(result.get(3, 3).unwrap().is_nan());
        assert_eq!(result.get(3, 2).unwrap(), 5.0);
        assert_eq!(result.get(2, 3).unwrap(), 5.0);
    }

    #[test]
    fn test_erode_keeps_grid() {
        let raster = make_raster(6, 4, 1.0);
        let result = erode(&raster, &SquareWindow::new(2)).unwrap();
        assert!(raster.ensure_same_grid(&result).is_ok());
        assert!(result.nodata().is_some_and(|nd| nd.is_nan()));
    }

    #[test]
    fn test_erode_window_larger_than_raster() {
        let raster = make_raster(3, 3, 5.0);
        assert!(erode(&raster, &SquareWindow::new(5)).is_err());
    }
}
