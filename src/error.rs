//! Error types for the traffic light detector

use thiserror::Error;

/// Errors raised by the detector core
#[derive(Debug, Error)]
pub enum DetectorError {
    /// A route build was attempted with no waypoints
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A nearest-waypoint query was issued before any route was received
    #[error("route index has not been built yet")]
    IndexNotBuilt,

    /// A query position had a NaN or infinite coordinate
    #[error("non-finite position ({x}, {y})")]
    NonFinitePosition { x: f64, y: f64 },

    /// The dynamic light list does not line up with the static stop-line list
    #[error("light count mismatch: {configured} stop lines configured, {observed} lights observed")]
    LightCountMismatch { configured: usize, observed: usize },

    /// Configuration could not be read
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be parsed
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Configuration parsed but is unusable
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DetectorError>;
