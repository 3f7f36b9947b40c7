//! Request signing for the card callback endpoint.
//!
//! The signature is `base64(HMAC-SHA256(secret, timestamp ++ nonce ++ body))`
//! carried in `X-Lark-Signature` next to the timestamp and nonce headers.

use crate::error::{AppError, Result};
use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "X-Lark-Request-Timestamp";
pub const NONCE_HEADER: &str = "X-Lark-Request-Nonce";
pub const SIGNATURE_HEADER: &str = "X-Lark-Signature";

/// Characters of a signature that may appear in logs
const LOGGED_PREFIX_LEN: usize = 8;

/// Credentials used to authenticate callback requests.
///
/// Either part may be absent: without a secret no signature is required, and
/// without a token the envelope token is not checked.
#[derive(Debug, Clone)]
pub struct AuthContext {
    secret: Option<String>,
    expected_token: Option<String>,
}

impl AuthContext {
    /// Empty values disable the corresponding check
    pub fn new(secret: impl Into<String>, expected_token: Option<String>) -> Self {
        Self {
            secret: Some(secret.into()).filter(|secret| !secret.is_empty()),
            expected_token: expected_token.filter(|token| !token.is_empty()),
        }
    }

    /// Context from configured values, `None` when neither check is enabled
    pub fn from_settings(secret: &str, expected_token: &str) -> Option<Self> {
        let auth = Self::new(secret, Some(expected_token.to_string()));
        (auth.secret.is_some() || auth.expected_token.is_some()).then_some(auth)
    }

    pub fn requires_signature(&self) -> bool {
        self.secret.is_some()
    }

    pub fn expected_token(&self) -> Option<&str> {
        self.expected_token.as_deref()
    }

    /// Check the signature headers against the raw body
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<()> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };

        let timestamp = header(headers, TIMESTAMP_HEADER)?;
        let nonce = header(headers, NONCE_HEADER)?;
        let provided = header(headers, SIGNATURE_HEADER)?;

        let mac = signing_mac(secret, timestamp, nonce, body)?;
        let matches = match STANDARD.decode(provided) {
            Ok(raw) => mac.clone().verify_slice(&raw).is_ok(),
            Err(_) => false,
        };

        if !matches {
            let expected = STANDARD.encode(mac.finalize().into_bytes());
            warn!(
                provided = prefix(provided),
                expected = prefix(&expected),
                "Callback signature mismatch"
            );
            return Err(AppError::Authentication("signature mismatch".to_string()));
        }

        Ok(())
    }

    /// Check the verification token carried inside a decoded envelope
    pub fn verify_token(&self, token: Option<&str>) -> Result<()> {
        match self.expected_token() {
            Some(expected) if token != Some(expected) => {
                warn!("Callback verification token mismatch");
                Err(AppError::Authentication("token mismatch".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Signature for a request, base64 encoded
pub fn compute_signature(secret: &str, timestamp: &str, nonce: &str, body: &[u8]) -> Result<String> {
    let mac = signing_mac(secret, timestamp, nonce, body)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn signing_mac(secret: &str, timestamp: &str, nonce: &str, body: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("invalid signing key: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(nonce.as_bytes());
    mac.update(body);
    Ok(mac)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            warn!(header = name, "Callback missing signature header");
            AppError::Authentication(format!("missing {} header", name))
        })
}

fn prefix(signature: &str) -> &str {
    let end = signature
        .char_indices()
        .nth(LOGGED_PREFIX_LEN)
        .map(|(index, _)| index)
        .unwrap_or(signature.len());
    &signature[..end]
}
