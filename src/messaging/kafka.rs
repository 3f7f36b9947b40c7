//! Kafka queue implementation

use crate::config::KafkaConfig;
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::traits::{QueueConsumer, QueueMessage, QueueProducer};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;
use std::time::Duration;

/// Kafka producer
pub struct KafkaProducer {
    producer: FutureProducer,
    topic: String,
}

impl KafkaProducer {
    /// Create a new Kafka producer
    pub fn new(config: &KafkaConfig) -> MessagingResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("client.id", &config.client_id)
            .set("message.max.bytes", config.max_bytes.to_string())
            .set("message.timeout.ms", config.write_timeout_ms.to_string())
            .create()
            .map_err(|e| MessagingError::ConnectionFailed(format!("Kafka producer creation failed: {}", e)))?;

        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }
}

#[async_trait]
impl QueueProducer for KafkaProducer {
    async fn send(&self, key: &[u8], value: &[u8]) -> MessagingResult<()> {
        let mut record: FutureRecord<'_, [u8], [u8]> = FutureRecord::to(&self.topic).payload(value);
        if !key.is_empty() {
            record = record.key(key);
        }

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| MessagingError::PublishFailed(format!("Kafka publish failed: {}", e)))?;

        Ok(())
    }
}

/// Kafka consumer
pub struct KafkaConsumer {
    consumer: StreamConsumer,
}

impl KafkaConsumer {
    /// Create a Kafka consumer subscribed to the configured topic
    pub fn new(config: &KafkaConfig) -> MessagingResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("group.id", &config.consumer_group)
            .set("client.id", &config.client_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("max.partition.fetch.bytes", config.max_bytes.to_string())
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .create()
            .map_err(|e| MessagingError::ConnectionFailed(format!("Kafka consumer creation failed: {}", e)))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| MessagingError::SubscribeFailed(format!("Kafka subscribe failed: {}", e)))?;

        Ok(Self { consumer })
    }
}

#[async_trait]
impl QueueConsumer for KafkaConsumer {
    async fn recv(&self) -> MessagingResult<QueueMessage> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| MessagingError::ConsumeFailed(format!("Kafka recv failed: {}", e)))?;

        Ok(QueueMessage {
            key: msg.key().map(<[u8]>::to_vec).unwrap_or_default(),
            value: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            partition: msg.partition(),
            offset: msg.offset(),
        })
    }
}
