//! Error types for StandGIS

use thiserror::Error;

/// Main error type for StandGIS operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Missing CRS: {subject} has no coordinate reference system")]
    MissingCrs { subject: &'static str },

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Raster grids do not match: {reason}")]
    ShapeMismatch { reason: String },

    #[error("Invalid window size {size} for {rows}x{cols} raster ({reason})")]
    InvalidWindow {
        size: usize,
        rows: usize,
        cols: usize,
        reason: String,
    },

    #[error("Feature {index} has no usable '{field}' identifier")]
    MissingFeatureId { field: String, index: usize },

    #[error("Duplicate '{field}' identifier: {id}")]
    DuplicateFeatureId { field: String, id: String },

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for StandGIS operations
pub type Result<T> = std::result::Result<T, Error>;
