//! The five pipeline stages and the queue-delivery worker
//!
//! Each stage is a stateless handler invoked once per inbound delivery. A
//! handler either forwards one record to the next queue, intentionally
//! drops it, or fails the invocation so the substrate redelivers it.

pub mod acquirer;
pub mod embedder;
pub mod indexer;
pub mod ingestor;
pub mod persister;
pub mod worker;

pub use acquirer::{Acquirer, RetryPolicy};
pub use embedder::Embedder;
pub use indexer::Indexer;
pub use ingestor::{IngestReport, Ingestor};
pub use persister::Persister;
pub use worker::{PipelineRouter, PipelineWorker, Stage};

/// What a stage did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The record advanced to the next queue.
    Forwarded,
    /// The record was intentionally dropped; the invocation still succeeds.
    Dropped,
}
