pub mod auth;
pub mod callback;
pub mod crypto;
pub mod handlers;
pub mod routes;

pub use auth::AuthContext;
pub use crypto::EventCipher;
pub use routes::*;

use crate::ingress::Enqueuer;
use crate::notifications::CardDelivery;
use crate::supervisor::TaskSupervisor;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub enqueuer: Enqueuer,
    pub delivery: CardDelivery,
    pub supervisor: TaskSupervisor,
    pub auth: Option<AuthContext>,
    /// Decrypts callback bodies when an encrypt key is configured
    pub cipher: Option<EventCipher>,
    /// Budget for a whole ingress request, including enqueue retries
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(enqueuer: Enqueuer, delivery: CardDelivery, supervisor: TaskSupervisor) -> Self {
        Self {
            enqueuer,
            delivery,
            supervisor,
            auth: None,
            cipher: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Require signed callback requests
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Accept encrypted callback bodies
    pub fn with_cipher(mut self, cipher: EventCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
