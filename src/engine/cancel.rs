// src/engine/cancel.rs

//! Run-level cancellation.
//!
//! A cancellation pair is created per run: the scheduler and every in-flight
//! executor hold a [`CancelToken`]; whoever owns the [`CancelHandle`] can
//! request that the run stop. Cancellation marks all non-terminal tasks
//! `Skipped` and aborts in-flight attempts; partially completed side effects
//! are not rolled back.

use tokio::sync::watch;

/// Requests cancellation of a run. Cloneable; cancelling twice is a no-op.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already (run finished); that's fine.
        let _ = self.tx.send(true);
    }
}

/// Observes a cancellation request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested.
    ///
    /// If the handle is dropped without cancelling, this pends forever so
    /// that `select!` arms fall through to normal completion.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a connected handle/token pair for one run.
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_sees_cancellation() {
        let (handle, mut token) = cancellation();
        assert!(!token.is_cancelled());
        handle.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_never_cancels() {
        let (handle, mut token) = cancellation();
        drop(handle);

        let waited = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            token.cancelled(),
        )
        .await;
        assert!(waited.is_err(), "cancelled() must pend forever");
    }
}
