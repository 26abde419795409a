//! firmograph: company enrichment pipeline
//!
//! Five queue-triggered stages take a CSV roster of companies through
//! website text acquisition and embedding generation into a vector index
//! and a durable metadata store. Each stage is a stateless handler invoked
//! once per delivery; a content-addressed id derived from the company
//! website makes every downstream write an overwrite, which keeps the
//! pipeline safe under the substrate's at-least-once delivery.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod storage;
pub mod types;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use types::{
    CompanyRecord, EmbeddedRecord, IndexedRecord, ObjectCreated, ScrapedRecord, SizeBucket,
};
