//! Writes validated alert batches to the queue.

use crate::config::KafkaConfig;
use crate::error::{AppError, Result};
use crate::messaging::{MessagingError, QueueProducer};
use crate::metrics::RELAY_METRICS;
use crate::models::WebhookMessage;
use crate::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error};

/// Queue writer with bounded, deadline-aware retries
#[derive(Clone)]
pub struct Enqueuer {
    producer: Arc<dyn QueueProducer>,
    policy: RetryPolicy,
    write_timeout: Duration,
}

impl Enqueuer {
    pub fn new(producer: Arc<dyn QueueProducer>, policy: RetryPolicy, write_timeout: Duration) -> Self {
        Self {
            producer,
            policy,
            write_timeout,
        }
    }

    pub fn from_config(producer: Arc<dyn QueueProducer>, config: &KafkaConfig) -> Self {
        Self::new(
            producer,
            RetryPolicy::from_millis(config.write_retries, config.write_retry_backoff_ms),
            config.write_timeout(),
        )
    }

    /// Serialize `batch` and append it to the queue keyed by its partition key.
    ///
    /// Each attempt is bounded by the write timeout, clipped to `deadline`.
    pub async fn enqueue(&self, batch: &WebhookMessage, deadline: Instant) -> Result<()> {
        let value = serde_json::to_vec(batch)?;
        let key = batch.partition_key().as_bytes();
        let producer = &self.producer;
        let write_timeout = self.write_timeout;

        let result = self
            .policy
            .run_until("enqueue", Some(deadline), |attempt| {
                let value = &value;
                async move {
                    let attempt_deadline = (Instant::now() + write_timeout).min(deadline);
                    let outcome = match timeout_at(attempt_deadline, producer.send(key, value)).await {
                        Ok(result) => result,
                        Err(_) => Err(MessagingError::Timeout(format!(
                            "write attempt {} exceeded {:?}",
                            attempt, write_timeout
                        ))),
                    };

                    let label = match &outcome {
                        Ok(()) => "ok",
                        Err(MessagingError::Timeout(_)) => "timeout",
                        Err(_) => "error",
                    };
                    RELAY_METRICS.enqueue_attempts.with_label_values(&[label]).inc();
                    outcome
                }
            })
            .await;

        match result {
            Ok(()) => {
                debug!(key = batch.partition_key(), alerts = batch.alerts.len(), "Alert batch enqueued");
                Ok(())
            }
            Err(e) => {
                error!(
                    key = batch.partition_key(),
                    attempts = self.policy.attempts(),
                    error = %e,
                    "Failed to enqueue alert batch"
                );
                Err(AppError::Enqueue(e.to_string()))
            }
        }
    }
}
