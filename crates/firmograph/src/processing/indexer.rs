//! Indexer stage: content-addressed upsert into the vector index

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::providers::queue::{self, QueuePublisher};
use crate::providers::vector_index::{VectorIndex, VectorPoint};
use crate::types::{EmbeddedRecord, IndexedRecord};

use super::StageOutcome;

/// Content-addressed identifier: SHA-256 of the normalized website,
/// hex-encoded. The same website always yields the same id, which makes
/// every downstream write an overwrite and the whole pipeline safe under
/// duplicate delivery.
pub fn content_id(company_website: &str) -> String {
    hex::encode(Sha256::digest(company_website.as_bytes()))
}

pub struct Indexer {
    index: Arc<dyn VectorIndex>,
    publisher: Arc<dyn QueuePublisher>,
    output_queue: String,
}

impl Indexer {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        publisher: Arc<dyn QueuePublisher>,
        output_queue: impl Into<String>,
    ) -> Self {
        Self {
            index,
            publisher,
            output_queue: output_queue.into(),
        }
    }

    /// Upsert the vector with its metadata, then hand the metadata to the
    /// persist queue. An upsert failure fails the invocation: the record
    /// must not reach the persister while the index write is missing, or
    /// vector and metadata would diverge.
    pub async fn handle(&self, record: &EmbeddedRecord) -> Result<StageOutcome> {
        let company = &record.company;
        let id = content_id(&company.company_website);
        tracing::info!(
            company = %company.company_name,
            website = %company.company_website,
            id = %id,
            "upserting embedding"
        );

        self.index
            .upsert(VectorPoint {
                id: id.clone(),
                values: record.embedding.clone(),
                metadata: company.clone(),
            })
            .await?;

        let indexed = IndexedRecord {
            id,
            company: company.clone(),
        };
        queue::send_json(self.publisher.as_ref(), &self.output_queue, &indexed).await?;
        Ok(StageOutcome::Forwarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::Error;
    use crate::providers::local::{MemoryQueue, MemoryVectorIndex};
    use crate::types::{CompanyRecord, SizeBucket};

    fn embedded(website: &str, location: &str) -> EmbeddedRecord {
        EmbeddedRecord {
            company: CompanyRecord {
                company_name: "Test Company".into(),
                company_website: website.into(),
                employee_size: SizeBucket::Small,
                location: location.into(),
            },
            embedding: vec![0.1; 256],
        }
    }

    #[test]
    fn content_id_is_deterministic_and_stable() {
        assert_eq!(
            content_id("https://test.com"),
            "396936bd0bf0603d6784b65d03e96dae90566c36b62661f28d4116c516524bcc"
        );
        assert_eq!(
            content_id("https://www.test1.com"),
            "8c61d9cfce00b163c8f9844c1a71b272beb1e0d24c3a42394a5be51018e4c6bb"
        );
        assert_eq!(
            content_id("https://www.test1.com"),
            content_id("https://www.test1.com")
        );
    }

    #[tokio::test]
    async fn upserts_and_forwards_metadata() {
        let index = Arc::new(MemoryVectorIndex::new());
        let queue = Arc::new(MemoryQueue::new());
        let indexer = Indexer::new(index.clone(), queue.clone(), "persist");

        let outcome = indexer
            .handle(&embedded("https://www.test1.com", "USA"))
            .await
            .unwrap();
        assert_eq!(outcome, StageOutcome::Forwarded);

        let expected_id = "8c61d9cfce00b163c8f9844c1a71b272beb1e0d24c3a42394a5be51018e4c6bb";
        let point = index.get(expected_id).unwrap();
        assert_eq!(point.values.len(), 256);
        assert_eq!(point.metadata.company_name, "Test Company");

        let forwarded: IndexedRecord =
            serde_json::from_str(&queue.receive("persist").unwrap().body).unwrap();
        assert_eq!(forwarded.id, expected_id);
        assert_eq!(forwarded.company.location, "USA");
    }

    #[tokio::test]
    async fn reprocessing_overwrites_rather_than_duplicates() {
        let index = Arc::new(MemoryVectorIndex::new());
        let queue = Arc::new(MemoryQueue::new());
        let indexer = Indexer::new(index.clone(), queue, "persist");

        indexer
            .handle(&embedded("https://www.test1.com", "USA"))
            .await
            .unwrap();
        indexer
            .handle(&embedded("https://www.test1.com", "Canada"))
            .await
            .unwrap();

        assert_eq!(index.len(), 1);
        let id = content_id("https://www.test1.com");
        assert_eq!(index.get(&id).unwrap().metadata.location, "Canada");
    }

    #[tokio::test]
    async fn upsert_failure_does_not_forward() {
        struct BrokenIndex;

        #[async_trait]
        impl VectorIndex for BrokenIndex {
            async fn upsert(&self, _point: VectorPoint) -> Result<()> {
                Err(Error::vector_index("index offline"))
            }

            fn name(&self) -> &str {
                "broken"
            }
        }

        let queue = Arc::new(MemoryQueue::new());
        let indexer = Indexer::new(Arc::new(BrokenIndex), queue.clone(), "persist");

        let result = indexer.handle(&embedded("https://www.test1.com", "USA")).await;
        assert!(result.is_err());
        assert_eq!(queue.ready_len("persist"), 0);
    }
}
