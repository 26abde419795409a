//! Queue-delivery worker
//!
//! One durable queue per hop, one consumer per stage, one record per
//! delivery. A successful dispatch acks; a failed or timed-out dispatch
//! nacks with requeue and the substrate redelivers. Undecodable bodies are
//! discarded outright: redelivering them could never succeed.

use std::sync::Arc;
use std::time::Duration;

use amqprs::channel::{BasicAckArguments, BasicConsumeArguments, BasicNackArguments, BasicQosArguments, Channel};
use amqprs::consumer::AsyncConsumer;
use amqprs::{BasicProperties, Deliver};
use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::config::{PipelineConfig, QueueTopology};
use crate::error::{Error, Result};
use crate::types::{CompanyRecord, EmbeddedRecord, IndexedRecord, ObjectCreated, ScrapedRecord};

use super::{Acquirer, Embedder, Indexer, Ingestor, Persister};
use crate::providers::amqp::{declare_durable_queue, AmqpClient};

/// One processing stage, identified by the queue it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Acquire,
    Embed,
    Index,
    Persist,
}

impl Stage {
    pub fn all() -> [Stage; 5] {
        [
            Stage::Ingest,
            Stage::Acquire,
            Stage::Embed,
            Stage::Index,
            Stage::Persist,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Acquire => "acquire",
            Stage::Embed => "embed",
            Stage::Index => "index",
            Stage::Persist => "persist",
        }
    }

    /// The queue this stage consumes from.
    pub fn queue<'a>(&self, queues: &'a QueueTopology) -> &'a str {
        match self {
            Stage::Ingest => &queues.ingest,
            Stage::Acquire => &queues.acquire,
            Stage::Embed => &queues.embed,
            Stage::Index => &queues.index,
            Stage::Persist => &queues.persist,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routes one delivery body to the owning stage handler.
pub struct PipelineRouter {
    ingestor: Ingestor,
    acquirer: Acquirer,
    embedder: Embedder,
    indexer: Indexer,
    persister: Persister,
}

impl PipelineRouter {
    pub fn new(
        ingestor: Ingestor,
        acquirer: Acquirer,
        embedder: Embedder,
        indexer: Indexer,
        persister: Persister,
    ) -> Self {
        Self {
            ingestor,
            acquirer,
            embedder,
            indexer,
            persister,
        }
    }

    /// Process exactly one record. `Err` means the delivery should be
    /// redelivered; an undecodable body is logged and discarded instead,
    /// since no redelivery can fix it.
    pub async fn dispatch(&self, stage: Stage, body: &str) -> Result<()> {
        match stage {
            Stage::Ingest => {
                if let Some(event) = decode::<ObjectCreated>(stage, body) {
                    self.ingestor.handle(&event).await?;
                }
            }
            Stage::Acquire => {
                if let Some(record) = decode::<CompanyRecord>(stage, body) {
                    self.acquirer.handle(&record).await?;
                }
            }
            Stage::Embed => {
                if let Some(record) = decode::<ScrapedRecord>(stage, body) {
                    self.embedder.handle(&record).await?;
                }
            }
            Stage::Index => {
                if let Some(record) = decode::<EmbeddedRecord>(stage, body) {
                    self.indexer.handle(&record).await?;
                }
            }
            Stage::Persist => {
                if let Some(record) = decode::<IndexedRecord>(stage, body) {
                    self.persister.handle(&record).await?;
                }
            }
        }
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(stage: Stage, body: &str) -> Option<T> {
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(stage = %stage, "discarding undecodable message: {err}");
            None
        }
    }
}

struct StageConsumer {
    stage: Stage,
    router: Arc<PipelineRouter>,
    stage_timeout: Duration,
}

#[async_trait]
impl AsyncConsumer for StageConsumer {
    async fn consume(
        &mut self,
        channel: &Channel,
        deliver: Deliver,
        _basic_properties: BasicProperties,
        content: Vec<u8>,
    ) {
        let delivery_tag = deliver.delivery_tag();
        let body = match String::from_utf8(content) {
            Ok(body) => body,
            Err(_) => {
                tracing::error!(stage = %self.stage, "discarding non-UTF-8 message body");
                ack(channel, delivery_tag).await;
                return;
            }
        };

        match timeout(self.stage_timeout, self.router.dispatch(self.stage, &body)).await {
            Ok(Ok(())) => ack(channel, delivery_tag).await,
            Ok(Err(err)) => {
                tracing::warn!(stage = %self.stage, "dispatch failed, requeueing: {err}");
                nack_requeue(channel, delivery_tag).await;
            }
            Err(_) => {
                tracing::warn!(
                    stage = %self.stage,
                    "dispatch exceeded {}s stage timeout, requeueing",
                    self.stage_timeout.as_secs()
                );
                nack_requeue(channel, delivery_tag).await;
            }
        }
    }
}

async fn ack(channel: &Channel, delivery_tag: u64) {
    if let Err(err) = channel
        .basic_ack(BasicAckArguments::new(delivery_tag, false))
        .await
    {
        tracing::error!("failed to acknowledge message: {err}");
    }
}

async fn nack_requeue(channel: &Channel, delivery_tag: u64) {
    if let Err(err) = channel
        .basic_nack(BasicNackArguments::new(delivery_tag, false, true))
        .await
    {
        tracing::error!("failed to nack message: {err}");
    }
}

/// Hosts the five stage consumers on one broker connection.
pub struct PipelineWorker;

impl PipelineWorker {
    /// Declare the queue topology, start a consumer per stage, and park
    /// until the process is stopped.
    pub async fn run(config: &PipelineConfig, router: Arc<PipelineRouter>) -> Result<()> {
        let client = AmqpClient::connect(&config.amqp.url).await?;
        let stage_timeout = Duration::from_secs(config.worker.stage_timeout_secs);

        let mut channels = Vec::new();
        for stage in Stage::all() {
            let queue = stage.queue(&config.queues).to_string();
            let channel = client.open_channel().await?;
            declare_durable_queue(&channel, &queue).await?;
            channel
                .basic_qos(BasicQosArguments::new(0, config.amqp.prefetch, false))
                .await
                .map_err(|e| Error::Queue(format!("failed to set qos on '{queue}': {e}")))?;
            channel
                .basic_consume(
                    StageConsumer {
                        stage,
                        router: Arc::clone(&router),
                        stage_timeout,
                    },
                    BasicConsumeArguments::new(&queue, ""),
                )
                .await
                .map_err(|e| Error::Queue(format!("failed to consume from '{queue}': {e}")))?;
            tracing::info!(stage = %stage, queue = %queue, "stage consumer started");
            channels.push(channel);
        }

        // Consume until the process is stopped.
        let guard = Notify::new();
        guard.notified().await;
        Ok(())
    }
}
