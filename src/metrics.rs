//! Prometheus metrics for the relay pipeline

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

/// Relay metrics
pub struct RelayMetrics {
    /// Enqueue attempts by outcome (ok, error, timeout)
    pub enqueue_attempts: IntCounterVec,

    /// Ingress batches by final result (accepted, rejected, failed)
    pub ingress_batches: IntCounterVec,

    /// Failed queue reads that triggered a reconnect backoff
    pub consumer_read_failures: IntCounter,

    /// Queue records skipped because their body was not a valid batch
    pub malformed_messages: IntCounter,

    /// Card posts and updates by card kind and outcome (delivered, exhausted)
    pub cards: IntCounterVec,

    /// Callback requests by outcome
    pub callbacks: IntCounterVec,
}

lazy_static! {
    pub static ref RELAY_METRICS: RelayMetrics = RelayMetrics {
        enqueue_attempts: register_int_counter_vec!(
            "alert_relay_enqueue_attempts_total",
            "Total number of queue write attempts",
            &["outcome"]
        )
        .unwrap(),

        ingress_batches: register_int_counter_vec!(
            "alert_relay_ingress_batches_total",
            "Total number of inbound alert batches",
            &["result"]
        )
        .unwrap(),

        consumer_read_failures: register_int_counter!(
            "alert_relay_consumer_read_failures_total",
            "Total number of failed queue reads"
        )
        .unwrap(),

        malformed_messages: register_int_counter!(
            "alert_relay_malformed_messages_total",
            "Total number of queue records that could not be decoded"
        )
        .unwrap(),

        cards: register_int_counter_vec!(
            "alert_relay_cards_total",
            "Total number of card posts and updates",
            &["kind", "outcome"]
        )
        .unwrap(),

        callbacks: register_int_counter_vec!(
            "alert_relay_callbacks_total",
            "Total number of card callback requests",
            &["outcome"]
        )
        .unwrap(),
    };
}

/// Initialize relay metrics
pub fn init_metrics() {
    lazy_static::initialize(&RELAY_METRICS);
}

/// Render the default registry in the Prometheus text exposition format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
