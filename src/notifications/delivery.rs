use crate::cards::RenderedCard;
use crate::metrics::RELAY_METRICS;
use crate::notifications::error::{NotifyError, NotifyResult};
use crate::notifications::transport::{ApiReply, CardTransport};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{error, info};

/// Posts and updates cards under a retry policy.
///
/// An attempt only counts as delivered when the call completes and the reply
/// code is zero; an in-band error inside a successful response is retried like
/// a transport failure.
#[derive(Clone)]
pub struct CardDelivery {
    transport: Arc<dyn CardTransport>,
    policy: RetryPolicy,
}

impl CardDelivery {
    pub fn new(transport: Arc<dyn CardTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Post a card into a chat
    pub async fn post(&self, chat_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply> {
        let transport = &self.transport;
        let result = self
            .policy
            .run("post_card", |_| async move {
                check_reply(transport.post_card(chat_id, card).await)
            })
            .await;

        record("post", card, &result);
        match &result {
            Ok(reply) => info!(
                chat_id,
                kind = card.kind(),
                message_id = reply.message_id.as_deref().unwrap_or_default(),
                "Card delivered"
            ),
            Err(e) => error!(
                chat_id,
                kind = card.kind(),
                attempts = self.policy.attempts(),
                error = %e,
                "Failed to deliver card"
            ),
        }
        result
    }

    /// Replace the content of an existing message
    pub async fn update(&self, message_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply> {
        let transport = &self.transport;
        let result = self
            .policy
            .run("update_card", |_| async move {
                check_reply(transport.update_card(message_id, card).await)
            })
            .await;

        record("update", card, &result);
        match &result {
            Ok(_) => info!(message_id, kind = card.kind(), "Card updated"),
            Err(e) => error!(
                message_id,
                kind = card.kind(),
                attempts = self.policy.attempts(),
                error = %e,
                "Failed to update message"
            ),
        }
        result
    }
}

/// Fold a non-zero reply code into the error path
fn check_reply(result: NotifyResult<ApiReply>) -> NotifyResult<ApiReply> {
    let reply = result?;
    if reply.is_success() {
        Ok(reply)
    } else {
        Err(NotifyError::InBand {
            code: reply.code,
            msg: reply.msg,
        })
    }
}

fn record(operation: &str, card: &RenderedCard, result: &NotifyResult<ApiReply>) {
    let kind = format!("{}_{}", operation, card.kind());
    let outcome = if result.is_ok() { "delivered" } else { "exhausted" };
    RELAY_METRICS.cards.with_label_values(&[kind.as_str(), outcome]).inc();
}
