use crate::cards::RenderedCard;
use crate::notifications::error::NotifyResult;
use async_trait::async_trait;

/// Application-level answer of the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    /// Zero on success
    pub code: i64,
    pub msg: String,
    /// Identifier of the created message, for posts
    pub message_id: Option<String>,
}

impl ApiReply {
    pub fn ok(message_id: Option<String>) -> Self {
        Self {
            code: 0,
            msg: "success".to_string(),
            message_id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Chat platform operations used by the relay.
///
/// `Err` means the call itself failed; a completed call returns the platform's
/// [`ApiReply`] even when its code reports an application error.
#[async_trait]
pub trait CardTransport: Send + Sync {
    /// Post a card into a chat
    async fn post_card(&self, chat_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply>;

    /// Replace the content of a previously posted card
    async fn update_card(&self, message_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply>;
}
