// src/engine/scheduler.rs

//! The control loop driving one run of a task graph.
//!
//! Semantics live in a synchronous step layer ([`RunLoop`]) operating on the
//! [`RunStateStore`]; the only async surface is waiting for executor
//! completion events, retry timers and cancellation. One event is processed
//! per loop iteration, and all `RunStateStore` transitions happen on this
//! loop, so eligibility recomputation always observes a consistent store.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::cancel::{cancellation, CancelToken};
use crate::engine::report::RunReport;
use crate::errors::EngineError;
use crate::exec::{ActionExecutor, ExecutionContext, Executor, Outcome};
use crate::state::{FailureReason, RunStateStore, TaskStatus};
use crate::Graph;

/// Events flowing back into the scheduler loop.
#[derive(Debug)]
enum ExecEvent {
    /// One attempt of the task at this index finished.
    Finished { task: usize, outcome: Outcome },
    /// The backoff for a failed attempt has elapsed.
    RetryDue { task: usize },
}

/// Owns a graph and executes it, one run at a time.
///
/// The graph is shared read-only across the lifetime of each run; per-run
/// state is created in [`run`](Scheduler::run) and returned as the
/// [`RunReport`], never retained between runs.
pub struct Scheduler {
    graph: Arc<Graph>,
    executor: Arc<dyn Executor>,
    /// Monotonically increasing run ID.
    run_counter: u64,
}

impl Scheduler {
    pub fn new(graph: Graph) -> Self {
        Self::with_executor(graph, Arc::new(ActionExecutor))
    }

    /// Use a custom executor (tests swap in recording/scripted executors).
    pub fn with_executor(graph: Graph, executor: Arc<dyn Executor>) -> Self {
        Self {
            graph: Arc::new(graph),
            executor,
            run_counter: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Execute the graph once with a bounded worker pool.
    pub async fn run(
        &mut self,
        concurrency_limit: NonZeroUsize,
    ) -> Result<RunReport, EngineError> {
        let (_handle, token) = cancellation();
        self.run_with_cancel(concurrency_limit, token).await
    }

    /// Execute the graph once, observing an external cancellation token.
    pub async fn run_with_cancel(
        &mut self,
        concurrency_limit: NonZeroUsize,
        mut cancel: CancelToken,
    ) -> Result<RunReport, EngineError> {
        self.run_counter += 1;
        let run_id = self.run_counter;

        info!(
            run_id,
            tasks = self.graph.len(),
            concurrency = concurrency_limit.get(),
            "starting run"
        );

        let (tx, mut rx) = mpsc::channel::<ExecEvent>(64);

        let mut state = RunLoop {
            graph: &self.graph,
            executor: Arc::clone(&self.executor),
            store: RunStateStore::initialize(&self.graph),
            run_id,
            limit: concurrency_limit.get(),
            in_flight: 0,
            pending_retries: 0,
            cancelled: false,
            tx,
            cancel: cancel.clone(),
        };

        loop {
            state.propagate_skips()?;
            state.promote_ready()?;
            state.dispatch()?;

            if state.store.all_terminal() {
                break;
            }

            if state.in_flight == 0 && state.pending_retries == 0 {
                // Nothing will ever complete; unreachable for a validated
                // acyclic graph.
                return Err(EngineError::Stalled(state.store.pending_names()));
            }

            tokio::select! {
                maybe_event = rx.recv() => match maybe_event {
                    Some(event) => state.handle_event(event)?,
                    None => return Err(EngineError::ChannelClosed),
                },
                _ = cancel.cancelled(), if !state.cancelled => {
                    state.handle_cancel()?;
                }
            }
        }

        let report = RunReport::from_store(run_id, &state.store);
        info!(
            run_id,
            success = report.is_success(),
            "run finished"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("graph", &self.graph)
            .field("run_counter", &self.run_counter)
            .finish_non_exhaustive()
    }
}

/// Mutable state of one run in progress.
struct RunLoop<'g> {
    graph: &'g Graph,
    executor: Arc<dyn Executor>,
    store: RunStateStore,
    run_id: u64,
    limit: usize,
    /// Attempts currently occupying a worker slot.
    in_flight: usize,
    /// Backoff timers that have not fired yet. Tasks awaiting retry stay
    /// `Running` but occupy no worker slot.
    pending_retries: usize,
    cancelled: bool,
    tx: mpsc::Sender<ExecEvent>,
    cancel: CancelToken,
}

impl RunLoop<'_> {
    /// `Pending` tasks with a `Failed` or `Skipped` dependency become
    /// `Skipped` immediately. Iterates to a fixpoint so skips cascade down
    /// whole branches in one pass.
    fn propagate_skips(&mut self) -> Result<(), EngineError> {
        loop {
            let mut changed = false;

            for idx in 0..self.store.len() {
                if self.store.status(idx) != TaskStatus::Pending {
                    continue;
                }

                let blocked_by = self.graph.dep_indices(idx).find(|&dep| {
                    matches!(
                        self.store.status(dep),
                        TaskStatus::Failed | TaskStatus::Skipped
                    )
                });

                if let Some(dep) = blocked_by {
                    let dep_name = self.graph.task_at(dep).name().to_string();
                    warn!(
                        task = %self.store.name(idx),
                        run_id = self.run_id,
                        upstream = %dep_name,
                        "skipping task due to upstream failure"
                    );
                    self.store.transition(
                        idx,
                        TaskStatus::Skipped,
                        Some(FailureReason::UpstreamFailed(dep_name)),
                    )?;
                    changed = true;
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }

    /// `Pending` tasks whose dependencies have all `Succeeded` become
    /// `Ready`.
    fn promote_ready(&mut self) -> Result<(), EngineError> {
        for idx in 0..self.store.len() {
            if self.store.status(idx) != TaskStatus::Pending {
                continue;
            }

            let satisfied = self
                .graph
                .dep_indices(idx)
                .all(|dep| self.store.status(dep) == TaskStatus::Succeeded);

            if satisfied {
                self.store.transition(idx, TaskStatus::Ready, None)?;
            }
        }
        Ok(())
    }

    /// Dispatch `Ready` tasks in declaration order until the worker pool is
    /// full. This ordering is the deterministic tie-break when more tasks
    /// are ready than slots are free.
    fn dispatch(&mut self) -> Result<(), EngineError> {
        if self.cancelled {
            return Ok(());
        }

        for idx in 0..self.store.len() {
            if self.in_flight >= self.limit {
                break;
            }
            if self.store.status(idx) != TaskStatus::Ready {
                continue;
            }

            self.store.transition(idx, TaskStatus::Running, None)?;
            let attempt = self.store.attempts(idx);
            let task = self.graph.task_at(idx);

            info!(
                task = %task.name(),
                run_id = self.run_id,
                attempt,
                "dispatching task"
            );

            let ctx = ExecutionContext {
                run_id: self.run_id,
                task: task.name().to_string(),
                attempt,
            };
            let fut = self.executor.execute(
                Arc::clone(&task.action),
                task.timeout,
                ctx,
                self.cancel.clone(),
            );

            self.in_flight += 1;
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let outcome = fut.await;
                let _ = tx.send(ExecEvent::Finished { task: idx, outcome }).await;
            });
        }

        Ok(())
    }

    fn handle_event(&mut self, event: ExecEvent) -> Result<(), EngineError> {
        match event {
            ExecEvent::Finished { task, outcome } => self.handle_finished(task, outcome),
            ExecEvent::RetryDue { task } => self.handle_retry_due(task),
        }
    }

    fn handle_finished(&mut self, idx: usize, outcome: Outcome) -> Result<(), EngineError> {
        self.in_flight -= 1;

        if self.cancelled {
            // The run is being torn down. A success that raced the
            // cancellation still counts; anything else is skipped.
            return match outcome {
                Outcome::Success => {
                    self.store.transition(idx, TaskStatus::Succeeded, None)
                }
                Outcome::Failure(_) => self.store.transition(
                    idx,
                    TaskStatus::Skipped,
                    Some(FailureReason::Cancelled),
                ),
            };
        }

        match outcome {
            Outcome::Success => {
                debug!(
                    task = %self.store.name(idx),
                    run_id = self.run_id,
                    "task succeeded"
                );
                self.store.transition(idx, TaskStatus::Succeeded, None)
            }
            Outcome::Failure(reason) => self.handle_failure(idx, reason),
        }
    }

    fn handle_failure(
        &mut self,
        idx: usize,
        reason: FailureReason,
    ) -> Result<(), EngineError> {
        let attempts = self.store.attempts(idx);
        let policy = self.graph.task_at(idx).retry_policy();

        if attempts < policy.max_attempts() {
            let delay = policy.backoff_for(attempts);
            warn!(
                task = %self.store.name(idx),
                run_id = self.run_id,
                attempt = attempts,
                max_attempts = policy.max_attempts(),
                backoff_ms = delay.as_millis() as u64,
                error = %reason,
                "attempt failed; retrying after backoff"
            );

            self.store.note_failure(idx, reason);
            self.pending_retries += 1;

            let tx = self.tx.clone();
            let mut cancel = self.cancel.clone();
            tokio::spawn(async move {
                // Cancellation cuts the backoff short so teardown is prompt.
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {}
                }
                let _ = tx.send(ExecEvent::RetryDue { task: idx }).await;
            });

            Ok(())
        } else {
            warn!(
                task = %self.store.name(idx),
                run_id = self.run_id,
                attempts,
                error = %reason,
                "attempts exhausted; task failed"
            );
            self.store
                .transition(idx, TaskStatus::Failed, Some(reason))
        }
    }

    fn handle_retry_due(&mut self, idx: usize) -> Result<(), EngineError> {
        self.pending_retries -= 1;

        if self.cancelled {
            return self.store.transition(
                idx,
                TaskStatus::Skipped,
                Some(FailureReason::Cancelled),
            );
        }

        debug!(
            task = %self.store.name(idx),
            run_id = self.run_id,
            "backoff elapsed; task ready for retry"
        );
        self.store.transition(idx, TaskStatus::Ready, None)
    }

    /// Mark every task that has not started (or is queued) as `Skipped`.
    /// In-flight attempts and pending backoff timers resolve through their
    /// own events.
    fn handle_cancel(&mut self) -> Result<(), EngineError> {
        info!(run_id = self.run_id, "cancellation requested; skipping remaining tasks");
        self.cancelled = true;

        for idx in 0..self.store.len() {
            if matches!(
                self.store.status(idx),
                TaskStatus::Pending | TaskStatus::Ready
            ) {
                self.store.transition(
                    idx,
                    TaskStatus::Skipped,
                    Some(FailureReason::Cancelled),
                )?;
            }
        }
        Ok(())
    }
}
