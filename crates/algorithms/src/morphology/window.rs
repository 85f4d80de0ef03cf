//! Square structuring window

use serde::{Deserialize, Serialize};
use standgis_core::{Error, Result};

/// Square `size x size` window for erosion and dilation.
///
/// For odd sizes the window is centred on the cell. For even sizes the
/// extra cell falls after the centre on erosion (`[i - size/2,
/// i + size - 1 - size/2]`) and dilation uses the mirrored span, so that
/// `dilate(erode(x))` is still an opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareWindow {
    size: usize,
}

impl SquareWindow {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Side length in cells
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cells covered before the centre by the erosion window
    pub fn before(&self) -> usize {
        self.size / 2
    }

    /// Cells covered after the centre by the erosion window
    pub fn after(&self) -> usize {
        self.size.saturating_sub(1) - self.size / 2
    }

    /// The window mirrored through its centre (same shape for odd sizes)
    pub(crate) fn reflected_span(&self) -> (usize, usize) {
        (self.after(), self.before())
    }

    /// Check the window against a `rows x cols` grid
    pub fn validate_for(&self, rows: usize, cols: usize) -> Result<()> {
        let reason = if self.size == 0 {
            Some("window size must be at least 1")
        } else if self.size > rows || self.size > cols {
            Some("window is larger than the raster")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidWindow {
                size: self.size,
                rows,
                cols,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for SquareWindow {
    fn default() -> Self {
        Self::new(15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_window_is_centred() {
        let w = SquareWindow::new(15);
        assert_eq!((w.before(), w.after()), (7, 7));
        assert_eq!(w.reflected_span(), (7, 7));
    }

    #[test]
    fn test_even_window_span() {
        let w = SquareWindow::new(4);
        assert_eq!((w.before(), w.after()), (2, 1));
        assert_eq!(w.reflected_span(), (1, 2));
    }

    #[test]
    fn test_validate() {
        assert!(SquareWindow::new(3).validate_for(3, 10).is_ok());
        assert!(matches!(
            SquareWindow::new(0).validate_for(3, 3),
            Err(Error::InvalidWindow { size: 0, .. })
        ));
        assert!(matches!(
            SquareWindow::new(4).validate_for(10, 3),
            Err(Error::InvalidWindow { size: 4, rows: 10, cols: 3, .. })
        ));
    }
}
