//! Acquirer stage: company website to scraped plain text
//!
//! External site availability is unreliable, so this is the pipeline's
//! designated failure-absorption point: it is the only stage that routinely
//! fails and swallows the failure instead of escalating it. The retry is an
//! explicit bounded loop with an attempt counter; the backoff delay is a
//! pure function of the attempt index.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::ingestion::html;
use crate::providers::queue::{self, QueuePublisher};
use crate::providers::text_fetch::{FetchError, TextFetcher};
use crate::types::{CompanyRecord, ScrapedRecord};

use super::StageOutcome;

/// Bounded-retry policy for page fetches.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before the record is dropped.
    pub max_attempts: u32,
    /// Wall-clock budget for a single attempt.
    pub attempt_timeout: Duration,
    /// Base of the exponential backoff between attempts.
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(30),
            backoff_factor: 2,
        }
    }
}

impl From<&ScrapeConfig> for RetryPolicy {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            backoff_factor: config.backoff_factor,
        }
    }
}

/// Delay before the attempt following `attempt` (zero-based):
/// `backoff_factor ^ attempt` seconds.
pub fn backoff_delay(factor: u32, attempt: u32) -> Duration {
    Duration::from_secs(u64::from(factor).pow(attempt))
}

pub struct Acquirer {
    fetcher: Arc<dyn TextFetcher>,
    publisher: Arc<dyn QueuePublisher>,
    output_queue: String,
    retry: RetryPolicy,
}

impl Acquirer {
    pub fn new(
        fetcher: Arc<dyn TextFetcher>,
        publisher: Arc<dyn QueuePublisher>,
        output_queue: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            publisher,
            output_queue: output_queue.into(),
            retry,
        }
    }

    /// Fetch the company's page with bounded retries. On success the
    /// scraped text advances to the embed queue; on exhausted retries the
    /// record is dropped and the invocation still succeeds.
    pub async fn handle(&self, record: &CompanyRecord) -> Result<StageOutcome> {
        let url = &record.company_website;

        for attempt in 0..self.retry.max_attempts {
            match self.attempt(url).await {
                Ok(markup) => {
                    let scraped = ScrapedRecord {
                        company: record.clone(),
                        scraped_text: html::extract_text(&markup),
                    };
                    queue::send_json(self.publisher.as_ref(), &self.output_queue, &scraped)
                        .await?;
                    tracing::info!(
                        company = %record.company_name,
                        website = %url,
                        chars = scraped.scraped_text.len(),
                        "scraped website text"
                    );
                    return Ok(StageOutcome::Forwarded);
                }
                Err(err) => {
                    tracing::warn!(
                        website = %url,
                        attempt = attempt + 1,
                        max_attempts = self.retry.max_attempts,
                        "fetch attempt failed: {err}"
                    );
                }
            }

            if attempt + 1 < self.retry.max_attempts {
                tokio::time::sleep(backoff_delay(self.retry.backoff_factor, attempt)).await;
            }
        }

        tracing::warn!(
            company = %record.company_name,
            website = %url,
            "dropping record after {} failed fetch attempts",
            self.retry.max_attempts
        );
        Ok(StageOutcome::Dropped)
    }

    /// One fetch attempt under its own timeout, regardless of whether the
    /// fetcher enforces one itself.
    async fn attempt(&self, url: &str) -> std::result::Result<String, FetchError> {
        match tokio::time::timeout(self.retry.attempt_timeout, self.fetcher.fetch_page(url)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }
}
