use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use vellum_core::{AppError, AppResult};

/// Externally triggered cancellation shared by one request.
///
/// Clones observe the same signal. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancellationSignal {
    /// Creates a signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Fires the signal for every clone.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns whether the signal has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the signal fires.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // The sender lives as long as `self`, so this never resolves early.
            std::future::pending::<()>().await;
        }
    }

    /// Runs `operation` unless the signal fires first.
    pub async fn guard<T, F>(&self, operation: &str, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        if self.is_cancelled() {
            return Err(AppError::Cancelled(format!("{operation} was cancelled")));
        }

        tokio::select! {
            biased;
            () = self.cancelled() => Err(AppError::Cancelled(format!("{operation} was cancelled"))),
            result = future => result,
        }
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}
