//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use alert_relay::api::{AppState, AuthContext};
use alert_relay::cards::RenderedCard;
use alert_relay::ingress::Enqueuer;
use alert_relay::messaging::{MessagingError, MessagingResult, QueueProducer};
use alert_relay::notifications::{ApiReply, CardDelivery, CardTransport, NotifyResult};
use alert_relay::retry::RetryPolicy;
use alert_relay::supervisor::TaskSupervisor;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Chat transport that records every call and answers with a fixed code
#[derive(Default)]
pub struct RecordingTransport {
    pub posted: Mutex<Vec<(String, RenderedCard)>>,
    pub updated: Mutex<Vec<(String, RenderedCard)>>,
    /// In-band code returned by every call
    pub reply_code: i64,
}

impl RecordingTransport {
    pub fn failing_in_band(code: i64) -> Self {
        Self {
            reply_code: code,
            ..Default::default()
        }
    }

    fn reply(&self) -> ApiReply {
        ApiReply {
            code: self.reply_code,
            msg: if self.reply_code == 0 { "success" } else { "rate limited" }.to_string(),
            message_id: Some("om_posted".to_string()),
        }
    }
}

#[async_trait]
impl CardTransport for RecordingTransport {
    async fn post_card(&self, chat_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply> {
        self.posted.lock().push((chat_id.to_string(), card.clone()));
        Ok(self.reply())
    }

    async fn update_card(&self, message_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply> {
        self.updated.lock().push((message_id.to_string(), card.clone()));
        Ok(self.reply())
    }
}

/// Producer whose writes always fail
#[derive(Default)]
pub struct FailingProducer {
    pub calls: AtomicU32,
}

#[async_trait]
impl QueueProducer for FailingProducer {
    async fn send(&self, _key: &[u8], _value: &[u8]) -> MessagingResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MessagingError::PublishFailed("broker unavailable".to_string()))
    }
}

pub fn delivery(transport: Arc<dyn CardTransport>, attempts: i32) -> CardDelivery {
    CardDelivery::new(transport, RetryPolicy::from_millis(attempts, 1))
}

pub fn app_state(
    producer: Arc<dyn QueueProducer>,
    transport: Arc<dyn CardTransport>,
    auth: Option<AuthContext>,
) -> AppState {
    let enqueuer = Enqueuer::new(producer, RetryPolicy::from_millis(3, 10), Duration::from_secs(1));
    let state = AppState::new(enqueuer, delivery(transport, 3), TaskSupervisor::new())
        .with_request_timeout(Duration::from_secs(5));
    match auth {
        Some(auth) => state.with_auth(auth),
        None => state,
    }
}

/// Alertmanager webhook batch with a single firing alert
pub fn webhook_batch(fingerprint: &str) -> Value {
    json!({
        "version": "4",
        "groupKey": "{}:{alertname=\"HighMemory\"}",
        "truncatedAlerts": 0,
        "status": "firing",
        "receiver": "lark",
        "groupLabels": {"alertname": "HighMemory"},
        "commonLabels": {"alertname": "HighMemory"},
        "commonAnnotations": {},
        "externalURL": "http://alertmanager:9093",
        "alerts": [{
            "status": "firing",
            "labels": {"alertname": "HighMemory", "project": "payments"},
            "annotations": {
                "description": "memory above 90%",
                "notify_emails": "a@example.com,b@example.com",
                "runbook_url": "https://runbooks/high-memory"
            },
            "startsAt": "2025-03-01T08:30:00.123Z",
            "endsAt": "0001-01-01T00:00:00Z",
            "generatorURL": "http://prometheus:9090/graph?g0.expr=node_memory_usage%20%3E%200.9&g0.tab=1",
            "fingerprint": fingerprint
        }]
    })
}

/// Button value of a firing card for the given action
pub fn action_value(action: &str) -> Value {
    json!({
        "title": "HighMemory",
        "project": "payments",
        "time": "2025-03-01T08:30:00.123Z",
        "grafana_url": "N/A",
        "runbook_url": "https://runbooks/high-memory",
        "metric": "http://prometheus:9090/graph?g0.expr=up",
        "description": "memory above 90%",
        "action": action
    })
}

/// Card action callback envelope addressed at `message_id`
pub fn card_callback(message_id: &str, value: Value) -> Value {
    json!({
        "schema": "2.0",
        "header": {
            "event_id": "evt-1",
            "token": "verification-token",
            "event_type": "card.action.trigger"
        },
        "event": {
            "operator": {"open_id": "ou_1"},
            "action": {"tag": "button", "value": value},
            "context": {"open_message_id": message_id, "open_chat_id": "oc_alerts"}
        }
    })
}
