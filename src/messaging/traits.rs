//! Queue trait abstractions

use crate::messaging::error::MessagingResult;
use async_trait::async_trait;

/// A record read from the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Alert fingerprint, empty when the batch had none
    pub key: Vec<u8>,
    /// JSON encoded alert batch
    pub value: Vec<u8>,
    pub partition: i32,
    /// Position in the partition, only used for logging
    pub offset: i64,
}

/// Write side of the queue, shared by all ingress requests
#[async_trait]
pub trait QueueProducer: Send + Sync {
    /// Append one record; an empty key leaves partition choice to the backend
    async fn send(&self, key: &[u8], value: &[u8]) -> MessagingResult<()>;
}

/// Read side of the queue, owned by the delivery worker
#[async_trait]
pub trait QueueConsumer: Send + Sync {
    /// Wait for the next record
    async fn recv(&self) -> MessagingResult<QueueMessage>;
}
