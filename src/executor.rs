//! Deadline-bounded execution
//!
//! Runs an operation on its own worker (a tokio task or a thread from the
//! blocking pool) and waits for it up to a fixed deadline.
//!
//! # Limitation
//!
//! A deadline abandons the worker, it does not stop it. When the deadline
//! elapses the join handle is dropped, which detaches the worker: it keeps
//! running until it finishes on its own and may hold CPU, memory or sockets
//! until then. Its result is discarded and never reaches any caller.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

/// Failure modes of a bounded execution
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Operation timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Worker was cancelled")]
    WorkerCancelled,
}

impl ExecutionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

impl From<JoinError> for ExecutionError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Self::WorkerPanicked(message)
        } else {
            Self::WorkerCancelled
        }
    }
}

/// Runs operations on a background worker under a wall-clock deadline
#[derive(Debug, Clone, Copy)]
pub struct BoundedExecutor {
    deadline: Duration,
}

impl BoundedExecutor {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Run an async operation as a spawned task.
    ///
    /// Fallible operations should return their own `Result`; it is handed
    /// back unchanged inside `Ok`.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, ExecutionError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.join(tokio::spawn(operation)).await
    }

    /// Run a synchronous, CPU-bound operation on the blocking pool.
    pub async fn run_blocking<F, T>(&self, operation: F) -> Result<T, ExecutionError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.join(tokio::task::spawn_blocking(operation)).await
    }

    async fn join<T>(&self, handle: JoinHandle<T>) -> Result<T, ExecutionError> {
        match tokio::time::timeout(self.deadline, handle).await {
            Ok(joined) => Ok(joined?),
            Err(_) => {
                // Dropping the handle detaches the worker; nothing aborts it.
                tracing::warn!(
                    deadline_secs = self.deadline.as_secs_f64(),
                    "Bounded operation exceeded its deadline, abandoning worker"
                );
                Err(ExecutionError::TimedOut(self.deadline))
            }
        }
    }
}
