//! AMQP delivery substrate
//!
//! Queues are durable and declared idempotently on startup. Publishing goes
//! through the default exchange with the queue name as routing key; every
//! message carries a generated message id and persistent delivery mode.
//! Redelivery counts and dead-letter routing are broker configuration, not
//! pipeline logic.

use amqprs::callbacks::{ChannelCallback, ConnectionCallback};
use amqprs::channel::{BasicPublishArguments, Channel, QueueDeclareArguments};
use amqprs::connection::{Connection, OpenConnectionArguments};
use amqprs::{Ack, BasicProperties, Cancel, Close, CloseChannel, Nack, Return};
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::queue::QueuePublisher;

type AmqpResult<T> = std::result::Result<T, amqprs::error::Error>;

pub struct WorkerConnectionCallback;

#[async_trait]
impl ConnectionCallback for WorkerConnectionCallback {
    async fn close(&mut self, _connection: &Connection, _close: Close) -> AmqpResult<()> {
        Ok(())
    }

    async fn blocked(&mut self, _connection: &Connection, _reason: String) {}

    async fn unblocked(&mut self, _connection: &Connection) {}

    async fn secret_updated(&mut self, _connection: &Connection) {}
}

pub struct WorkerChannelCallback;

#[async_trait]
impl ChannelCallback for WorkerChannelCallback {
    async fn close(&mut self, _channel: &Channel, _close: CloseChannel) -> AmqpResult<()> {
        Ok(())
    }
    async fn cancel(&mut self, _channel: &Channel, _cancel: Cancel) -> AmqpResult<()> {
        Ok(())
    }
    async fn flow(&mut self, _channel: &Channel, _active: bool) -> AmqpResult<bool> {
        Ok(true)
    }
    async fn publish_ack(&mut self, _channel: &Channel, _ack: Ack) {}
    async fn publish_nack(&mut self, _channel: &Channel, _nack: Nack) {}
    async fn publish_return(
        &mut self,
        _channel: &Channel,
        _ret: Return,
        _basic_properties: BasicProperties,
        _content: Vec<u8>,
    ) {
    }
}

/// One broker connection shared by the publisher and the stage consumers.
pub struct AmqpClient {
    connection: Connection,
}

impl AmqpClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let args = OpenConnectionArguments::try_from(url)
            .map_err(|e| Error::Queue(format!("invalid AMQP URL: {e}")))?;
        let connection = Connection::open(&args)
            .await
            .map_err(|e| Error::Queue(format!("failed to open AMQP connection: {e}")))?;
        connection
            .register_callback(WorkerConnectionCallback)
            .await
            .map_err(|e| Error::Queue(format!("failed to register connection callback: {e}")))?;
        Ok(Self { connection })
    }

    pub async fn open_channel(&self) -> Result<Channel> {
        let channel = self
            .connection
            .open_channel(None)
            .await
            .map_err(|e| Error::Queue(format!("failed to open AMQP channel: {e}")))?;
        channel
            .register_callback(WorkerChannelCallback)
            .await
            .map_err(|e| Error::Queue(format!("failed to register channel callback: {e}")))?;
        Ok(channel)
    }
}

/// Declare a durable queue, tolerating an existing declaration.
pub async fn declare_durable_queue(channel: &Channel, name: &str) -> Result<()> {
    channel
        .queue_declare(QueueDeclareArguments::durable_client_named(name))
        .await
        .map_err(|e| Error::Queue(format!("failed to declare queue '{name}': {e}")))?;
    Ok(())
}

/// Publisher handle over a single channel.
pub struct AmqpPublisher {
    channel: Channel,
}

impl AmqpPublisher {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl QueuePublisher for AmqpPublisher {
    async fn send(&self, queue: &str, body: String) -> Result<String> {
        let message_id = Uuid::new_v4().to_string();
        let mut properties = BasicProperties::default();
        properties.with_message_id(&message_id).with_persistence(true);

        self.channel
            .basic_publish(
                properties,
                body.into_bytes(),
                BasicPublishArguments::new("", queue),
            )
            .await
            .map_err(|e| Error::Queue(format!("publish to '{queue}' failed: {e}")))?;

        Ok(message_id)
    }

    fn name(&self) -> &str {
        "amqp"
    }
}
