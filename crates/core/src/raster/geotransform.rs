//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Slack, in cells, when deciding whether a cell center lies in a window
const CENTER_TOLERANCE: f64 = 1e-6;

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and map coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images, `row_rotation` and `col_rotation` are 0,
/// and `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

/// Half-open range of cells, `rows.0..rows.1` by `cols.0..cols.1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl CellWindow {
    pub fn is_empty(&self) -> bool {
        self.row_start >= self.row_end || self.col_start >= self.col_end
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.row_end - self.row_start) * (self.col_end - self.col_start)
        }
    }
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Create from GDAL-style array [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert pixel coordinates to map coordinates
    ///
    /// Returns the coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Convert pixel coordinates to map coordinates (top-left corner)
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Convert map coordinates to pixel coordinates
    ///
    /// Returns fractional pixel coordinates; use `.floor()` to get integer indices
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-10 {
            // Degenerate transformation
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Get the cell size (assumes square pixels and no rotation)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Check if this is a north-up image (no rotation)
    pub fn is_north_up(&self) -> bool {
        self.row_rotation.abs() < 1e-10
            && self.col_rotation.abs() < 1e-10
            && self.pixel_height < 0.0
    }

    /// Calculate the bounding box for a raster of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        envelope(&[
            self.pixel_to_geo_corner(0, 0),
            self.pixel_to_geo_corner(width, 0),
            self.pixel_to_geo_corner(0, height),
            self.pixel_to_geo_corner(width, height),
        ])
    }

    /// Cells whose centers may fall inside a map-space rectangle.
    ///
    /// Centers on the rectangle's edge are included even when rounding in
    /// the map-to-pixel conversion lands them a hair outside.
    ///
    /// The rectangle's corners are mapped to pixel space and the window
    /// covers every cell center within their envelope, clipped to a
    /// `rows x cols` grid. The window can be a superset for rotated grids;
    /// callers still test each center.
    pub fn cell_window(
        &self,
        (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
        rows: usize,
        cols: usize,
    ) -> CellWindow {
        let (c_min, r_min, c_max, r_max) = envelope(&[
            self.geo_to_pixel(min_x, min_y),
            self.geo_to_pixel(min_x, max_y),
            self.geo_to_pixel(max_x, min_y),
            self.geo_to_pixel(max_x, max_y),
        ]);

        let empty = CellWindow {
            row_start: 0,
            row_end: 0,
            col_start: 0,
            col_end: 0,
        };
        if !(c_min.is_finite() && r_min.is_finite() && c_max.is_finite() && r_max.is_finite()) {
            return empty;
        }

        // Cell i has its center at i + 0.5; centers within CENTER_TOLERANCE
        // of the envelope stay in so the caller's exact test decides
        let first = |lo: f64| (lo - 0.5 - CENTER_TOLERANCE).ceil().max(0.0);
        let past_last =
            |hi: f64, n: usize| ((hi - 0.5 + CENTER_TOLERANCE).floor() + 1.0).min(n as f64);

        let col_start = first(c_min);
        let col_end = past_last(c_max, cols);
        let row_start = first(r_min);
        let row_end = past_last(r_max, rows);

        if col_end <= col_start || row_end <= row_start {
            return empty;
        }

        CellWindow {
            row_start: row_start as usize,
            row_end: row_end as usize,
            col_start: col_start as usize,
            col_end: col_end as usize,
        }
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

fn envelope(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(min_x, min_y, max_x, max_y), &(x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        },
    )
}
