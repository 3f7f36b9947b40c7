//! Card interaction callbacks.
//!
//! Requests are authenticated on the raw body before anything is parsed, and
//! encrypted bodies are decrypted before the envelope is read. A
//! "resolve" click schedules an update that swaps the firing card for its
//! resolved form, rebuilt from the payload the button carried.

use crate::api::AppState;
use crate::cards::{render_resolved, ActionKind, CardActionPayload};
use crate::error::{AppError, Result};
use crate::metrics::RELAY_METRICS;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

const URL_VERIFICATION: &str = "url_verification";

/// Callback body as posted by the open platform
#[derive(Debug, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(default)]
    pub schema: Option<String>,
    /// Set on `url_verification` requests
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub header: Option<EventHeader>,
    #[serde(default)]
    pub event: Option<CardActionEvent>,
    /// Whole envelope, encrypted with the configured encrypt key
    #[serde(default)]
    pub encrypt: Option<String>,
}

impl CallbackEnvelope {
    /// Verification token, wherever this envelope version carries it
    pub fn verification_token(&self) -> Option<&str> {
        self.header
            .as_ref()
            .and_then(|header| header.token.as_deref())
            .or(self.token.as_deref())
            .or_else(|| self.event.as_ref().and_then(|event| event.token.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
pub struct EventHeader {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardActionEvent {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub action: Option<CardAction>,
    #[serde(default)]
    pub context: Option<ActionContext>,
}

#[derive(Debug, Deserialize)]
pub struct CardAction {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionContext {
    #[serde(default)]
    pub open_message_id: String,
    #[serde(default)]
    pub open_chat_id: String,
}

/// Handle a card callback request
pub async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let result = process(&state, &headers, &body);
    let outcome = match &result {
        Ok(CallbackOutcome::Challenge(_)) => "challenge",
        Ok(CallbackOutcome::Scheduled) => "scheduled",
        Ok(CallbackOutcome::Ignored) => "ignored",
        Err(AppError::Authentication(_)) => "unauthorized",
        Err(_) => "invalid",
    };
    RELAY_METRICS.callbacks.with_label_values(&[outcome]).inc();

    match result? {
        CallbackOutcome::Challenge(challenge) => Ok(Json(json!({ "challenge": challenge })).into_response()),
        CallbackOutcome::Scheduled | CallbackOutcome::Ignored => {
            Ok(Json(json!({ "message": "ok" })).into_response())
        }
    }
}

fn decode_envelope(body: &[u8]) -> Result<CallbackEnvelope> {
    serde_json::from_slice(body).map_err(|e| AppError::Decode(e.to_string()))
}

enum CallbackOutcome {
    Challenge(String),
    Scheduled,
    Ignored,
}

fn process(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<CallbackOutcome> {
    if let Some(auth) = &state.auth {
        auth.verify(headers, body)?;
    }

    let mut envelope = decode_envelope(body)?;
    if let Some(encrypted) = envelope.encrypt.take() {
        let Some(cipher) = &state.cipher else {
            return Err(AppError::Decode("encrypted callback but no encrypt key configured".to_string()));
        };
        envelope = decode_envelope(&cipher.decrypt(&encrypted)?)?;
        if envelope.encrypt.is_some() {
            return Err(AppError::Decode("nested encrypted callback".to_string()));
        }
    }

    if let Some(auth) = &state.auth {
        auth.verify_token(envelope.verification_token())?;
    }

    if envelope.kind.as_deref() == Some(URL_VERIFICATION) {
        let challenge = envelope.challenge.unwrap_or_default();
        info!("Answered url verification challenge");
        return Ok(CallbackOutcome::Challenge(challenge));
    }

    let Some(event) = envelope.event else {
        warn!(schema = ?envelope.schema, "Callback carried no card action");
        return Ok(CallbackOutcome::Ignored);
    };
    let (Some(action), Some(context)) = (event.action, event.context) else {
        warn!("Callback carried no card action");
        return Ok(CallbackOutcome::Ignored);
    };

    let payload: CardActionPayload =
        serde_json::from_value(action.value).map_err(|e| AppError::Decode(e.to_string()))?;

    info!(
        action = %payload.action,
        tag = %action.tag,
        message_id = %context.open_message_id,
        chat_id = %context.open_chat_id,
        "Received card action"
    );

    if payload.kind() != ActionKind::Resolve {
        info!(action = %payload.action, "Ignoring card action");
        return Ok(CallbackOutcome::Ignored);
    }

    let delivery = state.delivery.clone();
    let message_id = context.open_message_id;
    state.supervisor.spawn("resolve_card", async move {
        let card = render_resolved(&payload);
        delivery.update(&message_id, &card).await.map(|_| ())
    });

    Ok(CallbackOutcome::Scheduled)
}
