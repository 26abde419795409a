//! Google Cloud Storage object store
//!
//! Cloud backend for roster uploads; the pipeline only ever reads whole
//! objects.

use async_trait::async_trait;

use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;

use crate::error::{Error, Result};

use super::object_store::ObjectStore;

pub struct GcsObjectStore {
    client: GcsClient,
}

impl GcsObjectStore {
    pub async fn new() -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| Error::Config(format!("failed to create GCS client: {e}")))?;
        Ok(Self {
            client: GcsClient::new(config),
        })
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.client
            .download_object(
                &GetObjectRequest {
                    bucket: bucket.to_string(),
                    object: key.to_string(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| Error::ObjectStore(format!("failed to download {bucket}/{key}: {e}")))
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
