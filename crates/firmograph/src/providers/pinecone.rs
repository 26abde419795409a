//! Hosted vector index client

use std::time::Duration;

use async_trait::async_trait;

use crate::config::IndexConfig;
use crate::error::{Error, Result};

use super::vector_index::{VectorIndex, VectorPoint};

const UPSERT_TIMEOUT_SECS: u64 = 30;

/// Client for a Pinecone-style vector index.
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
}

impl PineconeIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        if config.host.is_empty() {
            return Err(Error::config("vector index host is not set"));
        }
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("vector index API key is not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSERT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            host: config.host.clone(),
            api_key,
            namespace: config.namespace.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/vectors/upsert", self.host.trim_end_matches('/'))
    }
}

#[derive(serde::Serialize)]
struct UpsertRequest {
    vectors: Vec<VectorPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, point: VectorPoint) -> Result<()> {
        let request = UpsertRequest {
            vectors: vec![point],
            namespace: self.namespace.clone(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::VectorIndex(format!("upsert request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorIndex(format!(
                "upsert failed ({status}): {body}"
            )));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
