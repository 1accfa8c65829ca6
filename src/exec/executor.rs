// src/exec/executor.rs

//! Single-attempt execution with timeout, panic containment and
//! cancellation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

use crate::engine::CancelToken;
use crate::exec::{ExecutionContext, Outcome, TaskAction};
use crate::state::FailureReason;

/// Trait abstracting how one attempt of a task action is executed.
///
/// Production code uses [`ActionExecutor`]; tests can provide their own
/// implementation to record dispatches or script outcomes.
pub trait Executor: Send + Sync {
    /// Run one attempt of `action` with a fresh context.
    ///
    /// The returned future resolves to an [`Outcome`]; it never propagates
    /// an uncontrolled fault into the scheduler loop.
    fn execute(
        &self,
        action: Arc<dyn TaskAction>,
        timeout: Option<Duration>,
        ctx: ExecutionContext,
        cancel: CancelToken,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send>>;
}

/// Production executor.
///
/// The action runs on its own Tokio task so a panic inside it is caught as
/// a `JoinError` instead of unwinding through the scheduler. Timeout expiry
/// and run cancellation both abort the attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionExecutor;

impl Executor for ActionExecutor {
    fn execute(
        &self,
        action: Arc<dyn TaskAction>,
        timeout: Option<Duration>,
        ctx: ExecutionContext,
        mut cancel: CancelToken,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send>> {
        Box::pin(async move {
            let task = ctx.task.clone();
            let attempt = ctx.attempt;

            let mut handle = tokio::spawn(action.run(ctx));

            let waited = tokio::select! {
                waited = wait_attempt(&mut handle, timeout) => waited,
                _ = cancel.cancelled() => {
                    handle.abort();
                    debug!(task = %task, attempt, "attempt aborted by run cancellation");
                    return Outcome::Failure(FailureReason::Cancelled);
                }
            };

            match waited {
                Waited::TimedOut => {
                    debug!(task = %task, attempt, "attempt exceeded timeout");
                    Outcome::Failure(FailureReason::Timeout)
                }
                Waited::Finished(Ok(Ok(()))) => Outcome::Success,
                Waited::Finished(Ok(Err(err))) => {
                    Outcome::Failure(FailureReason::Action(format!("{err:#}")))
                }
                Waited::Finished(Err(join_err)) if join_err.is_panic() => {
                    Outcome::Failure(FailureReason::Panicked(panic_message(join_err)))
                }
                Waited::Finished(Err(_aborted)) => {
                    Outcome::Failure(FailureReason::Cancelled)
                }
            }
        })
    }
}

enum Waited {
    Finished(Result<anyhow::Result<()>, JoinError>),
    TimedOut,
}

async fn wait_attempt(
    handle: &mut JoinHandle<anyhow::Result<()>>,
    timeout: Option<Duration>,
) -> Waited {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut *handle).await {
            Ok(joined) => Waited::Finished(joined),
            Err(_elapsed) => {
                handle.abort();
                Waited::TimedOut
            }
        },
        None => Waited::Finished((&mut *handle).await),
    }
}

fn panic_message(err: JoinError) -> String {
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cancellation;
    use crate::exec::action_fn;

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            run_id: 1,
            task: "t".to_string(),
            attempt: 1,
        }
    }

    #[tokio::test]
    async fn successful_action_reports_success() {
        let (_handle, token) = cancellation();
        let outcome = ActionExecutor
            .execute(action_fn(|_| async { Ok(()) }), None, ctx(), token)
            .await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn action_error_is_captured() {
        let (_handle, token) = cancellation();
        let outcome = ActionExecutor
            .execute(
                action_fn(|_| async { anyhow::bail!("disk full") }),
                None,
                ctx(),
                token,
            )
            .await;
        match outcome {
            Outcome::Failure(FailureReason::Action(msg)) => {
                assert!(msg.contains("disk full"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_expiry_is_a_failure() {
        let (_handle, token) = cancellation();
        let outcome = ActionExecutor
            .execute(
                action_fn(|_| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }),
                Some(Duration::from_millis(50)),
                ctx(),
                token,
            )
            .await;
        assert_eq!(outcome, Outcome::Failure(FailureReason::Timeout));
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let (_handle, token) = cancellation();
        let outcome = ActionExecutor
            .execute(
                action_fn(|_| async { panic!("boom") }),
                None,
                ctx(),
                token,
            )
            .await;
        match outcome {
            Outcome::Failure(FailureReason::Panicked(msg)) => {
                assert!(msg.contains("boom"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_the_attempt() {
        let (handle, token) = cancellation();
        let fut = ActionExecutor.execute(
            action_fn(|_| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }),
            None,
            ctx(),
            token,
        );

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });

        assert_eq!(fut.await, Outcome::Failure(FailureReason::Cancelled));
    }
}
