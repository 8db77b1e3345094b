//! # Error Types
//!
//! Custom error types for Orbit Sampler using `thiserror`.
//!
//! Every failure inside an acquisition iteration is one of these variants. The
//! loop logs [`SamplerError::kind`] together with the message and carries on.

use thiserror::Error;

/// Main error type for Orbit Sampler
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Sensor cluster read failures
    #[error("sensor read failed: {0}")]
    Sensor(String),

    /// Sub-satellite position failures
    #[error("position unavailable: {0}")]
    Position(String),

    /// Camera device or photo file failures
    #[error("capture failed: {0}")]
    Capture(String),

    /// Record sink failures
    #[error("record not persisted: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SamplerError {
    /// Short, stable name of the failure class, used in event log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            SamplerError::Sensor(_) => "SensorError",
            SamplerError::Position(_) => "PositionError",
            SamplerError::Capture(_) => "CaptureError",
            SamplerError::Persistence(_) => "PersistenceError",
            SamplerError::Config(_) => "ConfigError",
            SamplerError::Io(_) => "IoError",
        }
    }
}

/// Result type alias for Orbit Sampler
pub type Result<T> = std::result::Result<T, SamplerError>;
