//! Object store trait for reading uploaded roster files

use async_trait::async_trait;

use crate::error::Result;

/// Trait for fetching raw object bytes by bucket and key.
///
/// Implementations:
/// - `LocalObjectStore`: filesystem-rooted buckets
/// - `GcsObjectStore`: Google Cloud Storage (feature `gcp`)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the full contents of one object.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
