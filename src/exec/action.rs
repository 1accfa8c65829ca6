// src/exec/action.rs

//! The action contract for tasks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::graph::TaskName;

/// Engine-visible context handed to each attempt of an action.
///
/// Actions own no engine state; this is all they ever see of the run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Identifier of the run this attempt belongs to.
    pub run_id: u64,
    /// Name of the task being executed.
    pub task: TaskName,
    /// 1-based attempt number.
    pub attempt: u32,
}

/// An opaque, side-effecting operation the engine invokes.
///
/// Implementations may perform arbitrary external I/O (the engine never
/// inspects their effects) and must not retain references to run state.
/// Errors are reported as values; the executor contains panics separately.
pub trait TaskAction: Send + Sync {
    fn run(
        &self,
        ctx: ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
}

struct FnAction<F>(F);

impl<F, Fut> TaskAction for FnAction<F>
where
    F: Fn(ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(
        &self,
        ctx: ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        Box::pin((self.0)(ctx))
    }
}

/// Wrap an async closure as a [`TaskAction`].
///
/// ```
/// use dagrun::exec::action_fn;
///
/// let action = action_fn(|ctx| async move {
///     println!("attempt {} of {}", ctx.attempt, ctx.task);
///     Ok(())
/// });
/// ```
pub fn action_fn<F, Fut>(f: F) -> Arc<dyn TaskAction>
where
    F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnAction(f))
}
