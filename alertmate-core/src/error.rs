//! Error types for alertmate-core

use thiserror::Error;

/// Main error type for the alertmate-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persisted settings could not be read or written
    #[error("settings error: {0}")]
    Settings(String),

    /// Forwarding/transport error
    #[error("forward error: {0}")]
    Forward(String),
}

/// Result type alias for alertmate-core
pub type Result<T> = std::result::Result<T, Error>;
