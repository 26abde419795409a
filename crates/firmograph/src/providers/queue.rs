//! Queue publisher trait for the inter-stage delivery substrate

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Trait for durably enqueueing a serialized record.
///
/// Implementations:
/// - `AmqpPublisher`: AMQP broker, durable queues
/// - `MemoryQueue`: in-process substrate for the local backend and tests
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Enqueue `body` on `queue`, returning the delivery's message id.
    async fn send(&self, queue: &str, body: String) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Serialize `value` as JSON and enqueue it.
pub async fn send_json<T: Serialize + ?Sized>(
    publisher: &dyn QueuePublisher,
    queue: &str,
    value: &T,
) -> Result<String> {
    let body = serde_json::to_string(value)?;
    publisher.send(queue, body).await
}
