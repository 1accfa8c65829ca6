//! Scripted task actions for driving the scheduler in tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dagrun::exec::{action_fn, TaskAction};

/// Always succeeds immediately.
pub fn ok_action() -> Arc<dyn TaskAction> {
    action_fn(|_| async { Ok(()) })
}

/// Always fails with the given message.
pub fn failing_action(msg: &str) -> Arc<dyn TaskAction> {
    let msg = msg.to_string();
    action_fn(move |_| {
        let msg = msg.clone();
        async move { Err(anyhow::anyhow!(msg)) }
    })
}

/// Fails the first `failures` attempts, then succeeds.
pub fn flaky_action(failures: u32) -> Arc<dyn TaskAction> {
    let seen = Arc::new(AtomicU32::new(0));
    action_fn(move |ctx| {
        let seen = Arc::clone(&seen);
        async move {
            let attempt = seen.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= failures {
                anyhow::bail!("flaky failure on attempt {} of {}", attempt, ctx.task);
            }
            Ok(())
        }
    })
}

/// Sleeps for the given duration, then succeeds. Useful with paused-time
/// tests for timeouts and cancellation.
pub fn sleeping_action(duration: Duration) -> Arc<dyn TaskAction> {
    action_fn(move |_| async move {
        tokio::time::sleep(duration).await;
        Ok(())
    })
}

/// Appends the task name to `log` on every attempt, then succeeds.
pub fn recording_action(log: Arc<Mutex<Vec<String>>>) -> Arc<dyn TaskAction> {
    action_fn(move |ctx| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(ctx.task.clone());
            Ok(())
        }
    })
}
