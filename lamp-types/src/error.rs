//! Error types for lampsync wire formats.

use thiserror::Error;

/// An external identifier did not have the required shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Identifier was not exactly four characters long.
    #[error("external id {id:?} must be 4 characters, got {len}")]
    InvalidLength {
        /// The rejected identifier.
        id: String,
        /// Its length in characters.
        len: usize,
    },
}

/// A compact `con` payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload is shorter than the 4-character identifier prefix.
    #[error("payload truncated: {len} characters, need at least 4")]
    Truncated {
        /// Length of the payload in characters.
        len: usize,
    },
}

/// The `con` field could not be extracted from a JSON envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Body is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The nested content field is absent, null, or an object or array.
    #[error("missing content field at {path}")]
    MissingContent {
        /// JSON pointer that was expected to hold the content string.
        path: &'static str,
    },
}
