use crate::cards::RenderedCard;
use crate::config::LarkConfig;
use crate::notifications::error::{NotifyError, NotifyResult};
use crate::notifications::transport::{ApiReply, CardTransport};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tokens are refreshed this long before the platform expires them
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Reply codes meaning the tenant access token is invalid or expired
const INVALID_TOKEN_CODES: [i64; 2] = [99991663, 99991668];

/// Lark open platform client for interactive cards
#[derive(Clone)]
pub struct LarkClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    app_id: String,
    app_secret: String,
    token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    /// Lifetime in seconds
    #[serde(default)]
    expire: u64,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    receive_id: &'a str,
    msg_type: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct UpdateMessageRequest {
    content: String,
}

#[derive(Debug, Deserialize)]
struct LarkResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<MessageData>,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    #[serde(default)]
    message_id: Option<String>,
}

impl LarkClient {
    /// Create a new Lark client
    pub fn new(config: &LarkConfig) -> NotifyResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Tenant access token, fetched again when missing or about to expire
    async fn tenant_access_token(&self) -> NotifyResult<String> {
        let cached = self
            .token
            .read()
            .as_ref()
            .filter(|token| Instant::now() < token.refresh_at)
            .map(|token| token.value.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        let response: TokenResponse = self
            .client
            .post(format!(
                "{}/open-apis/auth/v3/tenant_access_token/internal",
                self.base_url
            ))
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await?
            .json()
            .await?;

        if response.code != 0 {
            return Err(NotifyError::InBand {
                code: response.code,
                msg: response.msg,
            });
        }

        let lifetime = Duration::from_secs(response.expire);
        let refresh_at = Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN);
        *self.token.write() = Some(CachedToken {
            value: response.tenant_access_token.clone(),
            refresh_at,
        });

        info!(expire_secs = response.expire, "Fetched Lark tenant access token");
        Ok(response.tenant_access_token)
    }

    /// Send an authorized request and read the platform reply.
    ///
    /// A body that parses as a platform reply is returned even for non-2xx
    /// statuses so its code can be inspected by the caller.
    async fn call(&self, request: RequestBuilder) -> NotifyResult<ApiReply> {
        let token = self.tenant_access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<LarkResponse>(&body) {
            Ok(reply) => {
                debug!(status = status.as_u16(), code = reply.code, "Lark API replied");
                if INVALID_TOKEN_CODES.contains(&reply.code) {
                    warn!(code = reply.code, "Tenant access token rejected, dropping cached token");
                    *self.token.write() = None;
                }
                Ok(ApiReply {
                    code: reply.code,
                    msg: reply.msg,
                    message_id: reply.data.and_then(|data| data.message_id),
                })
            }
            Err(_) => Err(NotifyError::Transport(format!(
                "Lark API failed with status {}: {}",
                status, body
            ))),
        }
    }
}

#[async_trait]
impl CardTransport for LarkClient {
    async fn post_card(&self, chat_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply> {
        let payload = CreateMessageRequest {
            receive_id: chat_id,
            msg_type: "interactive",
            content: card.to_json()?,
        };

        let request = self
            .client
            .post(format!("{}/open-apis/im/v1/messages", self.base_url))
            .query(&[("receive_id_type", "chat_id")])
            .json(&payload);

        self.call(request).await
    }

    async fn update_card(&self, message_id: &str, card: &RenderedCard) -> NotifyResult<ApiReply> {
        let payload = UpdateMessageRequest {
            content: card.to_json()?,
        };

        let request = self
            .client
            .patch(format!("{}/open-apis/im/v1/messages/{}", self.base_url, message_id))
            .json(&payload);

        self.call(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lark_client_creation() {
        let config = LarkConfig {
            base_url: "https://open.larksuite.com/".to_string(),
            ..Default::default()
        };
        let client = LarkClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://open.larksuite.com");
    }
}
