//! Error types for ucmonitor

use thiserror::Error;

/// Main error type for ucmonitor operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Layer has no CRS")]
    MissingCrs,

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

/// Result type alias for ucmonitor operations
pub type Result<T> = std::result::Result<T, Error>;
