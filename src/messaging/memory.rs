//! Process-local queue backed by a tokio channel

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{QueueConsumer, QueueMessage, QueueProducer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{mpsc, Mutex};

/// Create a connected producer/consumer pair
pub fn in_memory_queue() -> (InMemoryProducer, InMemoryConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        InMemoryProducer {
            tx,
            next_offset: AtomicI64::new(0),
        },
        InMemoryConsumer { rx: Mutex::new(rx) },
    )
}

pub struct InMemoryProducer {
    tx: mpsc::UnboundedSender<QueueMessage>,
    next_offset: AtomicI64,
}

#[async_trait]
impl QueueProducer for InMemoryProducer {
    async fn send(&self, key: &[u8], value: &[u8]) -> MessagingResult<()> {
        let message = QueueMessage {
            key: key.to_vec(),
            value: value.to_vec(),
            partition: 0,
            offset: self.next_offset.fetch_add(1, Ordering::SeqCst),
        };
        self.tx.send(message).map_err(|_| MessagingError::Closed)
    }
}

pub struct InMemoryConsumer {
    rx: Mutex<mpsc::UnboundedReceiver<QueueMessage>>,
}

#[async_trait]
impl QueueConsumer for InMemoryConsumer {
    async fn recv(&self) -> MessagingResult<QueueMessage> {
        self.rx.lock().await.recv().await.ok_or(MessagingError::Closed)
    }
}
