//! Morphological dilation (maximum filter)
//!
//! Replaces each cell with the maximum valid value in its window.
//! Enlarges bright regions and shrinks dark regions.

use standgis_core::raster::Raster;
use standgis_core::Result;

use super::filter::{build_output, masked_values, rank_filter, Extremum};
use super::window::SquareWindow;

/// Perform morphological dilation on a raster
///
/// Uses the window mirrored through the centre, `[i - after, i + before]`,
/// so that dilating an eroded raster with the same [`SquareWindow`] gives
/// an opening. For odd window sizes the mirror is the window itself.
/// No-data cells are ignored and come out as NaN.
pub fn dilate(raster: &Raster<f64>, window: &SquareWindow) -> Result<Raster<f64>> {
    window.validate_for(raster.rows(), raster.cols())?;

    let (before, after) = window.reflected_span();
    let values = masked_values(raster);
    let out = rank_filter(values.view(), before, after, Extremum::Max)?;
    Ok(build_output(raster, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dilate_spreads_peak() {
        let mut raster: Raster<f64> = Raster::filled(5, 5, 1.0);
        raster.set(2, 2, 9.0).unwrap();

        let result = dilate(&raster, &SquareWindow::new(3)).unwrap();
        for row in 0..5 {
            for col in 0..5 {
                let near = (1..=3).contains(&row) && (1..=3).contains(&col);
                let expected = if near { 9.0 } else { 1.0 };
                assert_eq!(result.get(row, col).unwrap(), expected, "({}, {})", row, col);
            }
        }
    }

    #[test]
    fn test_dilate_even_window_is_mirrored() {
        let raster = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0], 1, 5).unwrap();
        // A single row cannot hold a 2x2 window
        assert!(dilate(&raster, &SquareWindow::new(2)).is_err());

        let tall = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let result = dilate(&tall, &SquareWindow::new(2)).unwrap();
        // Span [i, i + 1] on both axes
        assert_eq!(result.get(0, 0).unwrap(), 5.0);
        assert_eq!(result.get(0, 2).unwrap(), 6.0);
        assert_eq!(result.get(1, 0).unwrap(), 5.0);
        assert_eq!(result.get(1, 2).unwrap(), 6.0);
    }

    #[test]
    fn test_dilate_nan_input_stays_nan() {
        let raster = Raster::from_vec(vec![1.0, f64::NAN, 3.0, 4.0], 2, 2).unwrap();
        let result = dilate(&raster, &SquareWindow::new(2)).unwrap();
        assert!(result.get(0, 1).unwrap().is_nan());
        assert_eq!(result.get(0, 0).unwrap(), 4.0);
    }
}
