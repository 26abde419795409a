//! Metadata store trait for the terminal key-value record

use async_trait::async_trait;

use crate::error::Result;
use crate::types::IndexedRecord;

/// Trait for the durable key-value store holding company metadata.
///
/// A put is a blind overwrite keyed by the record id, consistent with the
/// vector index's replace-by-id semantics.
///
/// Implementations:
/// - `SqliteMetadataStore`: durable local table
/// - `MemoryMetadataStore`: in-process map for tests
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Write one record, overwriting any previous item with the same id.
    async fn put(&self, record: &IndexedRecord) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
