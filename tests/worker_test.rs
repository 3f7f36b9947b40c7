mod common;

use alert_relay::api::build_router;
use alert_relay::cards::HeaderTemplate;
use alert_relay::config::AlertFieldKeys;
use alert_relay::messaging::{in_memory_queue, QueueProducer};
use alert_relay::processing::FieldExtractor;
use alert_relay::worker::{DeliveryWorker, WorkerState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{app_state, delivery, webhook_batch, RecordingTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_webhook_to_firing_card() {
    let (producer, consumer) = in_memory_queue();
    let transport = Arc::new(RecordingTransport::default());
    let app = build_router(app_state(Arc::new(producer), transport.clone(), None), false);

    let worker = DeliveryWorker::new(
        Arc::new(consumer),
        FieldExtractor::new(AlertFieldKeys::default()),
        delivery(transport.clone(), 3),
        "oc_alerts",
    );
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/lark/webhook")
                .header("content-type", "application/json")
                .body(Body::from(webhook_batch("fp-1").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    wait_until(|| !transport.posted.lock().is_empty()).await;
    shutdown.cancel();
    handle.await.unwrap();

    let posted = transport.posted.lock();
    assert_eq!(posted.len(), 1);
    let (chat_id, card) = &posted[0];
    assert_eq!(chat_id, "oc_alerts");
    assert_eq!(card.title(), "🚨 HighMemory");
    assert_eq!(card.card().header.template, HeaderTemplate::Red);

    let payload = card.action_payload().expect("firing card carries a resolve action");
    assert_eq!(payload.action, "resolve");
    assert_eq!(payload.title, "HighMemory");
    assert_eq!(payload.project, "payments");
    assert_eq!(payload.time, "2025-03-01T08:30:00.123Z");
    assert_eq!(payload.runbook_url, "https://runbooks/high-memory");
    assert_eq!(payload.grafana_url, "N/A");
    assert_eq!(payload.description, "memory above 90%");

    let content = card.to_json().unwrap();
    assert!(content.contains("<at email=a@example.com></at>"));
    assert!(content.contains("node_memory_usage > 0.9"));
    assert!(content.contains("2025-03-01 08:30:00.123"));
}

#[tokio::test]
async fn test_in_band_error_is_retried_then_skipped() {
    let (producer, consumer) = in_memory_queue();
    let transport = Arc::new(RecordingTransport::failing_in_band(99991400));

    let worker = DeliveryWorker::new(
        Arc::new(consumer),
        FieldExtractor::new(AlertFieldKeys::default()),
        delivery(transport.clone(), 3),
        "oc_alerts",
    );
    let mut state = worker.subscribe();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    let first = webhook_batch("fp-1").to_string();
    let second = webhook_batch("fp-2").to_string();
    producer.send(b"fp-1", first.as_bytes()).await.unwrap();
    producer.send(b"fp-2", second.as_bytes()).await.unwrap();

    // three attempts per alert, and the worker moves on to the next batch
    wait_until(|| transport.posted.lock().len() == 6).await;
    state.wait_for(|s| *s == WorkerState::Reading).await.unwrap();

    shutdown.cancel();
    handle.await.unwrap();
    assert_eq!(*state.borrow(), WorkerState::Stopped);
}
