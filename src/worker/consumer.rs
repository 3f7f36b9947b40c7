use crate::cards::AlertCard;
use crate::messaging::{QueueConsumer, QueueMessage};
use crate::metrics::RELAY_METRICS;
use crate::models::WebhookMessage;
use crate::notifications::CardDelivery;
use crate::processing::FieldExtractor;
use crate::worker::backoff::ReconnectBackoff;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Observable phase of the delivery loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Reading,
    Processing,
    Backoff,
    Stopped,
}

/// Reads alert batches from the queue and posts one firing card per alert
pub struct DeliveryWorker {
    consumer: Arc<dyn QueueConsumer>,
    extractor: FieldExtractor,
    delivery: CardDelivery,
    chat_id: String,
    backoff: ReconnectBackoff,
    state: watch::Sender<WorkerState>,
}

impl DeliveryWorker {
    pub fn new(
        consumer: Arc<dyn QueueConsumer>,
        extractor: FieldExtractor,
        delivery: CardDelivery,
        chat_id: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);
        Self {
            consumer,
            extractor,
            delivery,
            chat_id: chat_id.into(),
            backoff: ReconnectBackoff::default(),
            state,
        }
    }

    pub fn with_backoff(mut self, backoff: ReconnectBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Watch the loop's state transitions
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation is only observed while waiting for a record or sleeping
    /// after a failed read; a record already read is processed to completion.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(chat_id = %self.chat_id, "Delivery worker started");

        loop {
            self.set_state(WorkerState::Reading);
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.consumer.recv() => received,
            };

            match received {
                Ok(message) => {
                    self.backoff.reset();
                    self.set_state(WorkerState::Processing);
                    self.process(&message).await;
                }
                Err(e) => {
                    RELAY_METRICS.consumer_read_failures.inc();
                    let delay = self.backoff.next_delay();
                    error!(error = %e, retry_in_ms = delay.as_millis() as u64, "Failed to read from queue");

                    self.set_state(WorkerState::Backoff);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.set_state(WorkerState::Stopped);
        info!("Delivery worker stopped");
    }

    async fn process(&self, message: &QueueMessage) {
        let key = String::from_utf8_lossy(&message.key);
        info!(
            partition = message.partition,
            offset = message.offset,
            key = %key,
            "Received alert batch"
        );

        let batch: WebhookMessage = match serde_json::from_slice(&message.value) {
            Ok(batch) => batch,
            Err(e) => {
                RELAY_METRICS.malformed_messages.inc();
                warn!(offset = message.offset, error = %e, "Skipping malformed alert batch");
                return;
            }
        };

        for alert in &batch.alerts {
            let fields = self.extractor.extract(alert);
            let card = AlertCard::new(alert, fields).render_firing();
            debug!(fingerprint = %alert.fingerprint, title = card.title(), "Rendered firing card");

            // Exhaustion is logged by the delivery layer; move on to the next alert.
            let _ = self.delivery.post(&self.chat_id, &card).await;
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertFieldKeys;
    use crate::messaging::{in_memory_queue, MessagingError, MessagingResult, QueueProducer};
    use crate::notifications::{ApiReply, CardTransport, NotifyResult};
    use crate::cards::RenderedCard;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingTransport {
        posted: Mutex<Vec<(String, RenderedCard)>>,
    }

    #[async_trait]
    impl CardTransport for RecordingTransport {
        async fn post_card(&self, chat_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply> {
            self.posted.lock().push((chat_id.to_string(), card.clone()));
            Ok(ApiReply::ok(Some("om_1".to_string())))
        }

        async fn update_card(&self, _message_id: &str, _card: &RenderedCard) -> NotifyResult<ApiReply> {
            Ok(ApiReply::ok(None))
        }
    }

    /// Consumer whose reads always fail
    struct BrokenConsumer;

    #[async_trait]
    impl QueueConsumer for BrokenConsumer {
        async fn recv(&self) -> MessagingResult<QueueMessage> {
            Err(MessagingError::ConsumeFailed("broker unavailable".to_string()))
        }
    }

    fn worker(consumer: Arc<dyn QueueConsumer>, transport: Arc<RecordingTransport>) -> DeliveryWorker {
        let delivery = CardDelivery::new(transport, RetryPolicy::from_millis(1, 0));
        DeliveryWorker::new(
            consumer,
            FieldExtractor::new(AlertFieldKeys::default()),
            delivery,
            "oc_test",
        )
    }

    async fn wait_for(rx: &mut watch::Receiver<WorkerState>, wanted: WorkerState) {
        rx.wait_for(|state| *state == wanted).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped() {
        let (producer, consumer) = in_memory_queue();
        let transport = Arc::new(RecordingTransport::default());
        let worker = worker(Arc::new(consumer), transport.clone());
        let mut state = worker.subscribe();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));

        producer.send(b"", b"not json").await.unwrap();
        let batch = serde_json::json!({
            "status": "firing",
            "alerts": [{
                "status": "firing",
                "labels": {"alertname": "DiskFull"},
                "annotations": {},
                "startsAt": "2025-01-01T00:00:00Z",
                "generatorURL": "",
                "fingerprint": "fp-1"
            }]
        });
        producer.send(b"fp-1", batch.to_string().as_bytes()).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while transport.posted.lock().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        handle.await.unwrap();
        wait_for(&mut state, WorkerState::Stopped).await;

        let posted = transport.posted.lock();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "oc_test");
        assert_eq!(posted[0].1.title(), "🚨 DiskFull");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failures_back_off_until_cancelled() {
        let transport = Arc::new(RecordingTransport::default());
        let worker = worker(Arc::new(BrokenConsumer), transport);
        let mut state = worker.subscribe();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));

        wait_for(&mut state, WorkerState::Backoff).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(*state.borrow(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_cancel_while_idle_stops() {
        let (_producer, consumer) = in_memory_queue();
        let worker = worker(Arc::new(consumer), Arc::new(RecordingTransport::default()));
        let state = worker.subscribe();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        worker.run(shutdown).await;
        assert_eq!(*state.borrow(), WorkerState::Stopped);
    }
}
