//! Error types for queue operations

/// Result type for queue operations
pub type MessagingResult<T> = std::result::Result<T, MessagingError>;

/// Errors that can occur while producing to or consuming from the queue
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Publish failed
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Subscribe failed
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// Consume failed
    #[error("Consume failed: {0}")]
    ConsumeFailed(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Queue has been shut down
    #[error("Queue closed")]
    Closed,
}
