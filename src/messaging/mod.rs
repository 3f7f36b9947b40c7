//! Durable queue between ingress and the delivery worker.
//!
//! Ingress writes each validated alert batch as one record keyed by the first
//! alert's fingerprint; the delivery worker is the single reader. Kafka is the
//! production backend, the in-memory backend serves local runs and tests.

mod error;
mod kafka;
mod memory;
mod traits;

pub use error::{MessagingError, MessagingResult};
pub use kafka::{KafkaConsumer, KafkaProducer};
pub use memory::{in_memory_queue, InMemoryConsumer, InMemoryProducer};
pub use traits::{QueueConsumer, QueueMessage, QueueProducer};

use crate::config::{KafkaConfig, QueueBackend};
use std::sync::Arc;

/// Build the producer and consumer for the configured backend
pub fn create_queue(
    config: &KafkaConfig,
) -> MessagingResult<(Arc<dyn QueueProducer>, Arc<dyn QueueConsumer>)> {
    match config.backend {
        QueueBackend::Kafka => Ok((
            Arc::new(KafkaProducer::new(config)?),
            Arc::new(KafkaConsumer::new(config)?),
        )),
        QueueBackend::InMemory => {
            let (producer, consumer) = in_memory_queue();
            Ok((Arc::new(producer), Arc::new(consumer)))
        }
    }
}
