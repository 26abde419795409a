//! HTTP page fetchers
//!
//! `ScrapingApiClient` talks to a rendering/scraping API that fetches the
//! target page server-side; `DirectFetcher` issues a plain GET and serves
//! as the local backend. Both enforce the per-attempt timeout on the
//! underlying HTTP client.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};

use super::text_fetch::{FetchError, TextFetcher};

/// Client for a scraping API that returns rendered page markup.
pub struct ScrapingApiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    render_js: bool,
}

impl ScrapingApiClient {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("scraping API key is not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.attempt_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            render_js: config.render_js,
        })
    }
}

#[async_trait]
impl TextFetcher for ScrapingApiClient {
    async fn fetch_page(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("url", url),
                ("render_js", if self.render_js { "true" } else { "false" }),
            ])
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }

    fn name(&self) -> &str {
        "scraping-api"
    }
}

/// Plain HTTP fetcher for running without a scraping API.
pub struct DirectFetcher {
    client: reqwest::Client,
}

impl DirectFetcher {
    pub fn new(attempt_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(attempt_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TextFetcher for DirectFetcher {
    async fn fetch_page(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }

    fn name(&self) -> &str {
        "direct"
    }
}
