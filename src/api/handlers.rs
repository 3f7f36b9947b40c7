use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{gather_metrics, RELAY_METRICS};
use crate::models::WebhookMessage;
use axum::{body::Bytes, extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;
use validator::Validate;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub message: String,
    pub error: String,
}

/// Accept an Alertmanager webhook batch and write it to the queue
pub async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Result<Json<AckResponse>> {
    let deadline = Instant::now() + state.request_timeout;

    let batch = match parse_batch(&body) {
        Ok(batch) => batch,
        Err(e) => {
            RELAY_METRICS.ingress_batches.with_label_values(&["rejected"]).inc();
            return Err(e);
        }
    };

    info!(
        status = %batch.status,
        alerts = batch.alerts.len(),
        key = batch.partition_key(),
        "Received alert batch"
    );

    if let Err(e) = state.enqueuer.enqueue(&batch, deadline).await {
        RELAY_METRICS.ingress_batches.with_label_values(&["failed"]).inc();
        return Err(e);
    }

    RELAY_METRICS.ingress_batches.with_label_values(&["accepted"]).inc();
    Ok(Json(AckResponse {
        message: "received event and write to kafka successful".to_string(),
        error: String::new(),
    }))
}

fn parse_batch(body: &[u8]) -> Result<WebhookMessage> {
    let batch: WebhookMessage =
        serde_json::from_slice(body).map_err(|e| AppError::Validation(e.to_string()))?;
    batch.validate()?;
    Ok(batch)
}

/// Prometheus text exposition
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_rejects_schema_violations() {
        assert!(matches!(parse_batch(b"{"), Err(AppError::Validation(_))));
        assert!(matches!(
            parse_batch(br#"{"status":"firing"}"#),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_batch(br#"{"status":"","alerts":[]}"#),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_batch(br#"{"status":"firing","alerts":[{"status":""}]}"#),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_batch_accepts_minimal_batch() {
        let batch = parse_batch(br#"{"status":"firing","alerts":[{"status":"firing","fingerprint":"fp-1"}]}"#)
            .unwrap();
        assert_eq!(batch.partition_key(), "fp-1");
    }
}
