use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Inbound alert batch does not match the webhook schema
    #[error("Validation error: {0}")]
    Validation(String),

    /// Queue write failed after every configured attempt
    #[error("Enqueue failed: {0}")]
    Enqueue(String),

    /// Callback signature or token did not match
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Callback action payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Enqueue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human readable summary returned in the `message` field of error bodies
    pub fn summary(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "webhook event is not valid",
            AppError::Enqueue(_) => "write event to kafka failed",
            AppError::Authentication(_) => "request verification failed",
            AppError::Decode(_) => "invalid action request",
            AppError::Configuration(_) => "server misconfigured",
            AppError::Serialization(_) => "json marshal webhook event failed",
            AppError::Internal(_) => "internal error",
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let summary = self.summary();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status_code = status.as_u16(), message = %message, "Request error");
        } else {
            tracing::warn!(status_code = status.as_u16(), message = %message, "Request rejected");
        }

        // Authentication failures carry no detail back to the caller.
        let detail = match self {
            AppError::Authentication(_) => String::new(),
            _ => message,
        };

        let body = Json(json!({
            "message": summary,
            "error": detail,
        }));

        (status, body).into_response()
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
