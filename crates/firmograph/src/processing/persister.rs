//! Persister stage: terminal metadata write

use std::sync::Arc;

use crate::error::Result;
use crate::providers::kv_store::MetadataStore;
use crate::types::IndexedRecord;

pub struct Persister {
    store: Arc<dyn MetadataStore>,
}

impl Persister {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Blind overwrite put keyed by the record id. A failed write fails the
    /// invocation and is retried by redelivery; there is no local retry
    /// loop and no downstream hop.
    pub async fn handle(&self, record: &IndexedRecord) -> Result<()> {
        self.store.put(record).await?;
        tracing::info!(
            id = %record.id,
            company = %record.company.company_name,
            "metadata persisted"
        );
        Ok(())
    }
}
