//! Embedder stage: scraped text to a reduced, normalized vector

use std::sync::Arc;

use crate::config::EmbeddingConfig;
use crate::error::Result;
use crate::ingestion::tokens;
use crate::providers::embedding::EmbeddingProvider;
use crate::providers::queue::{self, QueuePublisher};
use crate::types::{EmbeddedRecord, ScrapedRecord};

use super::StageOutcome;

/// Keep the first `dimensions` components of a raw embedding.
///
/// Naive truncation rather than a projection; whether the embedding space
/// tolerates this is a property of the model in use and must be revisited
/// if the model changes.
pub fn reduce_dimensions(mut vector: Vec<f32>, dimensions: usize) -> Vec<f32> {
    vector.truncate(dimensions);
    vector
}

/// Scale the vector to unit Euclidean norm. An exactly-zero vector passes
/// through unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 {
        return;
    }
    for component in vector.iter_mut() {
        *component = (f64::from(*component) / norm) as f32;
    }
}

pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    publisher: Arc<dyn QueuePublisher>,
    output_queue: String,
    max_tokens: usize,
    dimensions: usize,
}

impl Embedder {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        publisher: Arc<dyn QueuePublisher>,
        output_queue: impl Into<String>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            provider,
            publisher,
            output_queue: output_queue.into(),
            max_tokens: config.max_tokens,
            dimensions: config.dimensions,
        }
    }

    /// Clamp the text to the token budget, request one embedding, reduce
    /// and normalize it, and forward the record. Provider failures drop the
    /// record; the queue's redelivery is the retry path, not this stage.
    pub async fn handle(&self, record: &ScrapedRecord) -> Result<StageOutcome> {
        let company = &record.company;
        tracing::info!(
            company = %company.company_name,
            website = %company.company_website,
            "generating embedding"
        );

        let text = match tokens::clamp_to_budget(&record.scraped_text, self.max_tokens) {
            Ok(text) => {
                if matches!(text, std::borrow::Cow::Owned(_)) {
                    tracing::info!(
                        website = %company.company_website,
                        max_tokens = self.max_tokens,
                        "text exceeds token budget, truncating"
                    );
                }
                text
            }
            Err(err) => {
                tracing::warn!(
                    website = %company.company_website,
                    "dropping record, token clamp failed: {err}"
                );
                return Ok(StageOutcome::Dropped);
            }
        };

        let raw = match self.provider.embed(&text).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    company = %company.company_name,
                    website = %company.company_website,
                    "dropping record, embedding failed: {err}"
                );
                return Ok(StageOutcome::Dropped);
            }
        };

        let mut embedding = reduce_dimensions(raw, self.dimensions);
        l2_normalize(&mut embedding);

        let embedded = EmbeddedRecord {
            company: company.clone(),
            embedding,
        };
        queue::send_json(self.publisher.as_ref(), &self.output_queue, &embedded).await?;
        tracing::info!(
            company = %company.company_name,
            dimensions = embedded.embedding.len(),
            "embedding queued for indexing"
        );
        Ok(StageOutcome::Forwarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::Error;
    use crate::providers::local::MemoryQueue;
    use crate::types::{CompanyRecord, SizeBucket};

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("provider unavailable"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn scraped() -> ScrapedRecord {
        ScrapedRecord {
            company: CompanyRecord {
                company_name: "Test Company".into(),
                company_website: "https://test.com".into(),
                employee_size: SizeBucket::Small,
                location: "USA".into(),
            },
            scraped_text: "Sample text for embedding generation.".into(),
        }
    }

    fn embedder(provider: Arc<dyn EmbeddingProvider>, queue: Arc<MemoryQueue>) -> Embedder {
        Embedder::new(provider, queue, "index", &EmbeddingConfig::default())
    }

    #[test]
    fn l2_normalize_yields_unit_norm() {
        let mut vector = vec![0.1_f32; 256];
        l2_normalize(&mut vector);
        let norm = vector.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_passes_through_unchanged() {
        let mut vector = vec![0.0_f32; 8];
        l2_normalize(&mut vector);
        assert_eq!(vector, vec![0.0_f32; 8]);
    }

    #[test]
    fn reduce_keeps_the_first_components() {
        let vector: Vec<f32> = (0..1536).map(|i| i as f32).collect();
        let reduced = reduce_dimensions(vector, 256);
        assert_eq!(reduced.len(), 256);
        assert_eq!(reduced[0], 0.0);
        assert_eq!(reduced[255], 255.0);
    }

    #[tokio::test]
    async fn raw_1536_vector_becomes_256_normalized() {
        let queue = Arc::new(MemoryQueue::new());
        let embedder = embedder(Arc::new(FixedEmbedder(vec![0.1; 1536])), queue.clone());

        let outcome = embedder.handle(&scraped()).await.unwrap();
        assert_eq!(outcome, StageOutcome::Forwarded);

        let message = queue.receive("index").unwrap();
        let value: serde_json::Value = serde_json::from_str(&message.body).unwrap();
        // Wire field stays plural.
        let embeddings = value["embeddings"].as_array().unwrap();
        assert_eq!(embeddings.len(), 256);
        assert_eq!(value["company_name"], "Test Company");
        assert_eq!(value["employee_size"], "11-50");

        let embedded: EmbeddedRecord = serde_json::from_str(&message.body).unwrap();
        let norm = embedded
            .embedding
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn provider_failure_drops_the_record() {
        let queue = Arc::new(MemoryQueue::new());
        let embedder = embedder(Arc::new(FailingEmbedder), queue.clone());

        let outcome = embedder.handle(&scraped()).await.unwrap();
        assert_eq!(outcome, StageOutcome::Dropped);
        assert_eq!(queue.ready_len("index"), 0);
    }

    #[tokio::test]
    async fn oversized_text_is_clamped_before_the_request() {
        use parking_lot::Mutex;

        struct CapturingEmbedder {
            seen: Mutex<Option<String>>,
        }

        #[async_trait]
        impl EmbeddingProvider for CapturingEmbedder {
            async fn embed(&self, text: &str) -> Result<Vec<f32>> {
                *self.seen.lock() = Some(text.to_string());
                Ok(vec![1.0; 1536])
            }

            fn name(&self) -> &str {
                "capturing"
            }
        }

        let provider = Arc::new(CapturingEmbedder {
            seen: Mutex::new(None),
        });
        let queue = Arc::new(MemoryQueue::new());
        let config = EmbeddingConfig {
            max_tokens: 16,
            ..EmbeddingConfig::default()
        };
        let embedder = Embedder::new(provider.clone(), queue, "index", &config);

        let mut record = scraped();
        record.scraped_text = "alpha beta gamma delta ".repeat(50);
        embedder.handle(&record).await.unwrap();

        let seen = provider.seen.lock().clone().unwrap();
        assert_eq!(crate::ingestion::tokens::token_count(&seen), 16);
    }
}
