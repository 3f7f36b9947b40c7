//! Delivery worker: the single reader of the alert queue.

mod backoff;
mod consumer;

pub use backoff::ReconnectBackoff;
pub use consumer::{DeliveryWorker, WorkerState};
