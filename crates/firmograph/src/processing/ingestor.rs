//! Ingestor stage: roster object to one CompanyRecord per row

use std::sync::Arc;

use crate::error::Result;
use crate::ingestion::parse_roster;
use crate::providers::object_store::ObjectStore;
use crate::providers::queue::{self, QueuePublisher};
use crate::types::ObjectCreated;

/// What one roster upload produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub rows_emitted: usize,
    pub rows_skipped: usize,
}

pub struct Ingestor {
    objects: Arc<dyn ObjectStore>,
    publisher: Arc<dyn QueuePublisher>,
    output_queue: String,
}

impl Ingestor {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        publisher: Arc<dyn QueuePublisher>,
        output_queue: impl Into<String>,
    ) -> Self {
        Self {
            objects,
            publisher,
            output_queue: output_queue.into(),
        }
    }

    /// Fetch the roster object, normalize every row, and publish one record
    /// per valid row.
    ///
    /// A fetch failure fails the whole invocation: the entire batch depends
    /// on that object. Malformed rows are skipped and counted; one bad row
    /// never voids an upload.
    pub async fn handle(&self, event: &ObjectCreated) -> Result<IngestReport> {
        let key = event.decoded_key();
        tracing::info!(bucket = %event.bucket, key = %key, "ingesting roster object");

        let bytes = self.objects.fetch(&event.bucket, &key).await?;
        let roster = parse_roster(&bytes)?;

        for record in &roster.records {
            queue::send_json(self.publisher.as_ref(), &self.output_queue, record).await?;
            tracing::debug!(
                company = %record.company_name,
                website = %record.company_website,
                "queued company for acquisition"
            );
        }

        let report = IngestReport {
            rows_emitted: roster.records.len(),
            rows_skipped: roster.skipped,
        };
        tracing::info!(
            emitted = report.rows_emitted,
            skipped = report.rows_skipped,
            "roster ingested"
        );
        Ok(report)
    }
}
