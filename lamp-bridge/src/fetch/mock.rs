//! Mock fetcher for testing.
//!
//! Allows scripting a response per URL and capturing the order of requests.

use super::{FetchError, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock fetcher for testing.
///
/// URLs without a scripted response fail with HTTP 404.
#[derive(Debug, Default, Clone)]
pub struct MockFetcher {
    inner: Arc<Mutex<MockFetcherInner>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct MockFetcherInner {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    requested: Vec<String>,
    latency: Duration,
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn respond(&self, url: &str, body: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.insert(url.to_string(), Ok(body));
    }

    /// Fail requests for `url` with the given error.
    pub fn fail(&self, url: &str, error: FetchError) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.insert(url.to_string(), Err(error));
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.latency = latency;
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.requested.clone()
    }

    /// Highest number of requests that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (response, latency) = {
            let mut inner = self.inner.lock().unwrap();
            inner.requested.push(url.to_string());
            let response = inner
                .responses
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status { status: 404 }));
            (response, inner.latency)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses() {
        let fetcher = MockFetcher::new();
        fetcher.respond("http://a", b"body".to_vec());
        fetcher.fail("http://b", FetchError::Timeout);

        assert_eq!(fetcher.get("http://a").await.unwrap(), b"body");
        assert_eq!(fetcher.get("http://b").await, Err(FetchError::Timeout));
        assert_eq!(
            fetcher.get("http://c").await,
            Err(FetchError::Status { status: 404 })
        );
        assert_eq!(fetcher.requested(), vec!["http://a", "http://b", "http://c"]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let fetcher = MockFetcher::new();
        let clone = fetcher.clone();
        clone.respond("http://a", vec![1]);

        fetcher.get("http://a").await.unwrap();
        assert_eq!(clone.requested().len(), 1);
        assert_eq!(clone.max_in_flight(), 1);
    }
}
