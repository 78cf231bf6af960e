//! Error types for container-dispatch

use thiserror::Error;

/// Crate-level error type
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Configuration rejected by validation
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A builder was finalized without a required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Error for a builder field that was never set
    pub fn missing_config(field: &'static str) -> Self {
        DispatchError::MissingField(field)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DispatchError>;
