//! Local and in-memory provider implementations
//!
//! `LocalObjectStore` serves roster files from a directory tree. The memory
//! providers back the local backend and the test suite; `MemoryQueue`
//! mirrors the substrate's in-flight/ack/nack semantics so at-least-once
//! redelivery stays observable without a broker.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::IndexedRecord;

use super::kv_store::MetadataStore;
use super::object_store::ObjectStore;
use super::queue::QueuePublisher;
use super::vector_index::{VectorIndex, VectorPoint};

/// Object store rooted at a directory: `<root>/<bucket>/<key>`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(bucket).join(key);
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::ObjectStore(format!("failed to read {bucket}/{key}: {e}")))
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}

/// In-memory object store for tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        self.objects.insert(format!("{bucket}/{key}"), bytes);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(&format!("{bucket}/{key}"))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::ObjectStore(format!("no such object {bucket}/{key}")))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// One message as handed to a consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message_id: String,
    pub body: String,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Delivery>,
    in_flight: HashMap<String, Delivery>,
}

/// In-process queue substrate with at-least-once semantics.
///
/// `receive` moves a message into the in-flight set; `ack` retires it and
/// `nack` returns it to the back of the queue for redelivery.
#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, QueueState>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ready message off `queue`, marking it in flight.
    pub fn receive(&self, queue: &str) -> Option<Delivery> {
        let mut queues = self.queues.lock();
        let state = queues.get_mut(queue)?;
        let delivery = state.ready.pop_front()?;
        state
            .in_flight
            .insert(delivery.message_id.clone(), delivery.clone());
        Some(delivery)
    }

    /// Retire an in-flight message.
    pub fn ack(&self, queue: &str, message_id: &str) {
        let mut queues = self.queues.lock();
        if let Some(state) = queues.get_mut(queue) {
            state.in_flight.remove(message_id);
        }
    }

    /// Return an in-flight message to the queue for redelivery.
    pub fn nack(&self, queue: &str, message_id: &str) {
        let mut queues = self.queues.lock();
        if let Some(state) = queues.get_mut(queue) {
            if let Some(delivery) = state.in_flight.remove(message_id) {
                state.ready.push_back(delivery);
            }
        }
    }

    /// Number of messages currently ready on `queue`.
    pub fn ready_len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .get(queue)
            .map(|state| state.ready.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl QueuePublisher for MemoryQueue {
    async fn send(&self, queue: &str, body: String) -> Result<String> {
        let message_id = Uuid::new_v4().to_string();
        let mut queues = self.queues.lock();
        queues.entry(queue.to_string()).or_default().ready.push_back(Delivery {
            message_id: message_id.clone(),
            body,
        });
        Ok(message_id)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// In-process replace-by-id vector index.
#[derive(Default)]
pub struct MemoryVectorIndex {
    points: DashMap<String, VectorPoint>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<VectorPoint> {
        self.points.get(id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, point: VectorPoint) -> Result<()> {
        self.points.insert(point.id.clone(), point);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// In-process metadata store for tests.
#[derive(Default)]
pub struct MemoryMetadataStore {
    items: DashMap<String, IndexedRecord>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, id: &str) -> Option<IndexedRecord> {
        self.items.get(id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn put(&self, record: &IndexedRecord) -> Result<()> {
        self.items.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
