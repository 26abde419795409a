//! Text-fetch trait for retrieving rendered page markup

use async_trait::async_trait;
use thiserror::Error;

/// Why one fetch attempt failed. Every variant is retryable; the split
/// exists for diagnostics.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Trait for fetching the rendered markup of a page.
///
/// Implementations:
/// - `ScrapingApiClient`: rendering/scraping API
/// - `DirectFetcher`: plain HTTP GET for the local backend
#[async_trait]
pub trait TextFetcher: Send + Sync {
    /// Fetch the markup behind `url`. One call is one attempt; retry policy
    /// belongs to the caller.
    async fn fetch_page(&self, url: &str) -> std::result::Result<String, FetchError>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
