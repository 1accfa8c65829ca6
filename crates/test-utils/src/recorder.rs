//! An [`Executor`] wrapper that records dispatch order.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dagrun::engine::CancelToken;
use dagrun::exec::{ActionExecutor, ExecutionContext, Executor, Outcome, TaskAction};

/// Records the task name of every dispatch (at `execute` call time, which is
/// the scheduler's deterministic tie-break point), then delegates to the
/// real [`ActionExecutor`].
pub struct RecordingExecutor {
    dispatched: Arc<Mutex<Vec<String>>>,
    inner: ActionExecutor,
}

impl RecordingExecutor {
    pub fn new(dispatched: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            dispatched,
            inner: ActionExecutor,
        }
    }
}

impl Executor for RecordingExecutor {
    fn execute(
        &self,
        action: Arc<dyn TaskAction>,
        timeout: Option<Duration>,
        ctx: ExecutionContext,
        cancel: CancelToken,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send>> {
        self.dispatched.lock().unwrap().push(ctx.task.clone());
        self.inner.execute(action, timeout, ctx, cancel)
    }
}
