//! Separable rank filter shared by erosion and dilation
//!
//! A min (max) over a rectangle is the min (max) over rows of the per-row
//! min (max), so the square window runs as a row pass followed by a column
//! pass. No-data cells are NaN here and are skipped by every comparison;
//! a cell that was no-data on input is NaN on output.

use ndarray::{Array2, ArrayView2, Axis};
use crate::maybe_rayon::*;
use standgis_core::raster::Raster;
use standgis_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Extremum {
    Min,
    Max,
}

impl Extremum {
    #[inline]
    fn pick(self, a: f64, b: f64) -> f64 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }

    /// Extremum of the valid values in `values`, NaN if there are none
    #[inline]
    fn fold(self, values: impl Iterator<Item = f64>) -> f64 {
        values
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, |acc, v| if acc.is_nan() { v } else { self.pick(acc, v) })
    }
}

/// Copy of the raster data with every no-data cell set to NaN
pub(crate) fn masked_values(raster: &Raster<f64>) -> Array2<f64> {
    raster.data().mapv(|v| if raster.is_nodata(v) { f64::NAN } else { v })
}

/// Clipped span `[i - before, i + after]` within `0..n`
#[inline]
fn span(i: usize, before: usize, after: usize, n: usize) -> std::ops::Range<usize> {
    i.saturating_sub(before)..(i + after + 1).min(n)
}

/// Apply the windowed extremum over `[-before, +after]` on both axes
pub(crate) fn rank_filter(
    values: ArrayView2<'_, f64>,
    before: usize,
    after: usize,
    op: Extremum,
) -> Result<Array2<f64>> {
    let (rows, cols) = values.dim();

    // Row pass
    let horizontal: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let line = values.index_axis(Axis(0), row);
            (0..cols)
                .map(|col| op.fold(span(col, before, after, cols).map(|c| line[c])))
                .collect::<Vec<f64>>()
        })
        .collect();
    let horizontal = ArrayView2::from_shape((rows, cols), &horizontal)
        .map_err(|e| Error::Other(e.to_string()))?;

    // Column pass, then restore the input no-data mask
    let out: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let rows_span = span(row, before, after, rows);
            (0..cols)
                .map(|col| {
                    if values[(row, col)].is_nan() {
                        f64::NAN
                    } else {
                        op.fold(rows_span.clone().map(|r| horizontal[(r, col)]))
                    }
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    Array2::from_shape_vec((rows, cols), out).map_err(|e| Error::Other(e.to_string()))
}

/// Wrap filtered values in a raster on the template's grid
pub(crate) fn build_output(template: &Raster<f64>, data: Array2<f64>) -> Raster<f64> {
    let mut output = template.with_same_meta::<f64>();
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = data;
    output
}
