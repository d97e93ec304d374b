//! Error types for the suggestion engine.

use thiserror::Error;

/// Remote fetch failures.
///
/// Every variant is a recoverable failure: the engine swallows it and
/// degrades to an empty result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Service error ({code}): {message}")]
    Status { code: u16, message: String },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The service cannot be reached at all (e.g., missing API key).
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A keymap entry names an unknown action.
    #[error("Invalid keymap: {0}")]
    InvalidKeymap(String),
}
