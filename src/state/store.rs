// src/state/store.rs

//! Run state store: one record per task for a single run.
//!
//! The store is the single source of truth the scheduler consults. It is
//! owned exclusively by the scheduler for the duration of a run; external
//! observers only ever see [`snapshot`](RunStateStore::snapshot) copies.

use std::time::SystemTime;

use tracing::debug;

use crate::errors::EngineError;
use crate::graph::{Graph, TaskName};
use crate::state::{FailureReason, TaskStatus};

/// Mutable per-task record for one run.
#[derive(Debug, Clone)]
pub struct TaskRunState {
    pub status: TaskStatus,
    /// Number of attempts started so far (incremented on entering `Running`).
    pub attempts: u32,
    /// Most recent failure. Kept across retries while attempts remain;
    /// cleared if the task eventually succeeds.
    pub last_error: Option<FailureReason>,
    /// Stamped when the first attempt enters `Running`.
    pub started_at: Option<SystemTime>,
    /// Stamped on entering a terminal state.
    pub finished_at: Option<SystemTime>,
}

impl TaskRunState {
    fn pending() -> Self {
        Self {
            status: TaskStatus::Pending,
            attempts: 0,
            last_error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Immutable copy of one task's state, as handed to observers.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub name: TaskName,
    pub state: TaskRunState,
}

struct Entry {
    name: TaskName,
    state: TaskRunState,
}

/// Key-value store from task to [`TaskRunState`], in graph declaration order.
///
/// Indices used by the crate-internal API are the graph's declaration-order
/// indices, so the scheduler never has to hash task names on the hot path.
pub struct RunStateStore {
    entries: Vec<Entry>,
}

impl RunStateStore {
    /// Every task starts `Pending` with zero attempts.
    pub fn initialize(graph: &Graph) -> Self {
        let entries = graph
            .tasks()
            .map(|task| Entry {
                name: task.name().to_string(),
                state: TaskRunState::pending(),
            })
            .collect();
        Self { entries }
    }

    pub(crate) fn status(&self, idx: usize) -> TaskStatus {
        self.entries[idx].state.status
    }

    pub(crate) fn attempts(&self, idx: usize) -> u32 {
        self.entries[idx].state.attempts
    }

    pub(crate) fn name(&self, idx: usize) -> &str {
        &self.entries[idx].name
    }

    /// Record a failed attempt without leaving `Running`.
    ///
    /// Used while a retry is pending: the task stays `Running` for the
    /// backoff window, but the error must already be observable.
    pub(crate) fn note_failure(&mut self, idx: usize, reason: FailureReason) {
        self.entries[idx].state.last_error = Some(reason);
    }

    /// Apply a state transition, enforcing the state machine.
    ///
    /// Illegal transitions are internal-invariant violations (a scheduler
    /// bug), not user errors.
    pub(crate) fn transition(
        &mut self,
        idx: usize,
        next: TaskStatus,
        error: Option<FailureReason>,
    ) -> Result<(), EngineError> {
        let entry = &mut self.entries[idx];
        let from = entry.state.status;

        if !from.can_transition_to(next) {
            return Err(EngineError::IllegalTransition {
                task: entry.name.clone(),
                from,
                to: next,
            });
        }

        debug!(task = %entry.name, %from, to = %next, "state transition");

        entry.state.status = next;

        if next == TaskStatus::Running {
            entry.state.attempts += 1;
            if entry.state.started_at.is_none() {
                entry.state.started_at = Some(SystemTime::now());
            }
        }

        if next.is_terminal() {
            entry.state.finished_at = Some(SystemTime::now());
        }

        match error {
            Some(reason) => entry.state.last_error = Some(reason),
            None if next == TaskStatus::Succeeded => entry.state.last_error = None,
            None => {}
        }

        Ok(())
    }

    /// Read-only lookup by task name, for observers.
    pub fn state_of(&self, name: &str) -> Option<&TaskRunState> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.state)
    }

    /// Immutable copy of every task's state, in declaration order.
    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.entries
            .iter()
            .map(|e| TaskSnapshot {
                name: e.name.clone(),
                state: e.state.clone(),
            })
            .collect()
    }

    pub(crate) fn all_terminal(&self) -> bool {
        self.entries.iter().all(|e| e.state.status.is_terminal())
    }

    pub(crate) fn pending_names(&self) -> Vec<TaskName> {
        self.entries
            .iter()
            .filter(|e| e.state.status == TaskStatus::Pending)
            .map(|e| e.name.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
