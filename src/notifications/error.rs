//! Error types for card delivery.

use thiserror::Error;

pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

/// Errors that can occur when posting or updating cards.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request never produced a usable response
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The open platform answered with a non-zero application code
    #[error("Lark API error: code={code}, msg={msg}")]
    InBand { code: i64, msg: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

impl NotifyError {
    pub fn is_in_band(&self) -> bool {
        matches!(self, NotifyError::InBand { .. })
    }
}
