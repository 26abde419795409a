//! Vector index trait for upserting company embeddings

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::types::CompanyRecord;

/// One vector plus its metadata, keyed by the content-addressed id.
#[derive(Debug, Clone, Serialize)]
pub struct VectorPoint {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: CompanyRecord,
}

/// Trait for the vector index.
///
/// Upsert is replace-by-id: re-processing the same website overwrites the
/// prior vector instead of duplicating it. The pipeline needs no delete or
/// query contract.
///
/// Implementations:
/// - `PineconeIndex`: hosted vector index
/// - `MemoryVectorIndex`: in-process map for the local backend and tests
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace one vector with its metadata.
    async fn upsert(&self, point: VectorPoint) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
