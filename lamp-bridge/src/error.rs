//! Error types for lampsync-bridge.

use crate::fetch::FetchError;

/// Main error type for bridge startup and serving.
///
/// Per-item and per-request failures never surface here; they are absorbed
/// into pull reports and push responses.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The fetch collaborator could not be constructed.
    #[error("fetch client error: {0}")]
    Fetch(#[from] FetchError),

    /// Failed to bind the push endpoint.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The configured bind address.
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
