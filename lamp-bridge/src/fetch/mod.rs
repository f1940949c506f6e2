//! Fetch abstraction for the boot-time pull sweep.
//!
//! The sweep only ever needs "GET this URL and give me the body", so the
//! trait is a single method. Any failure, including a non-success status,
//! comes back as a [`FetchError`] and costs only the one item.
//!
//! # Example
//!
//! ```ignore
//! let fetcher = MockFetcher::new();
//! fetcher.respond("http://cse/la", ContentResponse::new("L026ON").to_bytes()?);
//! let body = fetcher.get("http://cse/la").await?;
//! ```

mod http;
mod mock;

pub use http::HttpFetcher;
pub use mock::MockFetcher;

use async_trait::async_trait;
use thiserror::Error;

/// Fetch errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Client could not be built (bad header value, TLS setup).
    #[error("client setup failed: {0}")]
    Setup(String),

    /// Request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// Platform answered with a non-success status.
    #[error("HTTP error: {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,
}

/// GET collaborator for the pull channel.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body at `url`.
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
