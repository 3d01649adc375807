// src/error.rs
//! Error types for the regatta tracker

use std::fmt;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug)]
pub enum TrackerError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Image(image::ImageError),
    Gpx(String),
    /// A value handed to a geodesy routine was not a usable coordinate
    InvalidArgument(String),
    /// A track query matched fewer points than requested
    OutOfRange(String),
    /// The tile server answered with a non-success status
    Fetch(String),
    Config(String),
    Other(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Io(e) => write!(f, "IO error: {}", e),
            TrackerError::Json(e) => write!(f, "JSON error: {}", e),
            TrackerError::Http(e) => write!(f, "HTTP error: {}", e),
            TrackerError::Image(e) => write!(f, "Image error: {}", e),
            TrackerError::Gpx(msg) => write!(f, "GPX error: {}", msg),
            TrackerError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            TrackerError::OutOfRange(msg) => write!(f, "Out of range: {}", msg),
            TrackerError::Fetch(msg) => write!(f, "Tile fetch failed: {}", msg),
            TrackerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            TrackerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Io(e) => Some(e),
            TrackerError::Json(e) => Some(e),
            TrackerError::Http(e) => Some(e),
            TrackerError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(error: std::io::Error) -> Self {
        TrackerError::Io(error)
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(error: serde_json::Error) -> Self {
        TrackerError::Json(error)
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(error: reqwest::Error) -> Self {
        TrackerError::Http(error)
    }
}

impl From<image::ImageError> for TrackerError {
    fn from(error: image::ImageError) -> Self {
        TrackerError::Image(error)
    }
}

impl From<anyhow::Error> for TrackerError {
    fn from(error: anyhow::Error) -> Self {
        TrackerError::Other(error.to_string())
    }
}
