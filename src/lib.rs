//! Alertmanager to Lark relay.
//!
//! Ingress accepts Alertmanager webhook batches and writes them to a durable
//! queue. A delivery worker reads the queue and posts one interactive card per
//! alert into a Lark chat. Clicking a card's resolve button calls back into the
//! relay, which replaces the card with its resolved form.

pub mod api;
pub mod cards;
pub mod config;
pub mod error;
pub mod ingress;
pub mod messaging;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod processing;
pub mod retry;
pub mod supervisor;
pub mod worker;
