//! Supervised execution of fire-and-forget background tasks.

use std::fmt::Display;
use std::future::Future;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// Runs detached tasks, logs their failures and panics, and drains them on shutdown
#[derive(Clone, Default)]
pub struct TaskSupervisor {
    tracker: TaskTracker,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a named task. An `Err` result or a panic is logged, never propagated.
    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let inner = tokio::spawn(task);
        self.tracker.spawn(async move {
            match inner.await {
                Ok(Ok(())) => debug!(task = name, "Task completed"),
                Ok(Err(e)) => error!(task = name, error = %e, "Task failed"),
                Err(e) if e.is_panic() => error!(task = name, "Task panicked"),
                Err(e) => error!(task = name, error = %e, "Task cancelled"),
            }
        });
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Close the tracker and wait for every task spawned so far
    pub async fn shutdown(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(pending = self.tracker.len(), "Waiting for background tasks");
        }
        self.tracker.wait().await;
    }
}
