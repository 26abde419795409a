//! Provider abstractions for the pipeline's external collaborators
//!
//! One trait per boundary contract: object store reads, queue sends, page
//! fetches, embedding requests, vector upserts, and metadata puts. Stage
//! handlers hold `Arc<dyn ...>` handles created once and reused for the
//! process lifetime.

pub mod amqp;
pub mod embedding;
pub mod kv_store;
pub mod local;
pub mod object_store;
pub mod openai;
pub mod pinecone;
pub mod queue;
pub mod scrape;
pub mod text_fetch;
pub mod vector_index;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use embedding::EmbeddingProvider;
pub use kv_store::MetadataStore;
pub use object_store::ObjectStore;
pub use queue::QueuePublisher;
pub use text_fetch::{FetchError, TextFetcher};
pub use vector_index::{VectorIndex, VectorPoint};
