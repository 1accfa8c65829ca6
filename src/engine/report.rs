// src/engine/report.rs

//! The immutable result of one run.

use std::fmt;
use std::time::SystemTime;

use crate::graph::TaskName;
use crate::state::{FailureReason, RunStateStore, TaskStatus};

/// Final status of the pipeline as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Every task succeeded.
    Success,
    /// At least one task did not succeed.
    PartialFailure {
        /// Every non-succeeded task, in declaration order, with its reason.
        not_succeeded: Vec<TaskFailure>,
    },
}

impl PipelineStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineStatus::Success)
    }
}

/// One non-succeeded task inside [`PipelineStatus::PartialFailure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskName,
    pub status: TaskStatus,
    pub reason: Option<FailureReason>,
}

/// Per-task result in the run report.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: TaskName,
    pub status: TaskStatus,
    pub attempts: u32,
    pub last_error: Option<FailureReason>,
    pub started_at: Option<SystemTime>,
    pub finished_at: Option<SystemTime>,
}

/// Immutable snapshot returned when a run terminates.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: u64,
    pub status: PipelineStatus,
    /// Per-task reports in declaration order.
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub(crate) fn from_store(run_id: u64, store: &RunStateStore) -> Self {
        let tasks: Vec<TaskReport> = store
            .snapshot()
            .into_iter()
            .map(|snap| TaskReport {
                name: snap.name,
                status: snap.state.status,
                attempts: snap.state.attempts,
                last_error: snap.state.last_error,
                started_at: snap.state.started_at,
                finished_at: snap.state.finished_at,
            })
            .collect();

        let not_succeeded: Vec<TaskFailure> = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Succeeded)
            .map(|t| TaskFailure {
                task: t.name.clone(),
                status: t.status,
                reason: t.last_error.clone(),
            })
            .collect();

        let status = if not_succeeded.is_empty() {
            PipelineStatus::Success
        } else {
            PipelineStatus::PartialFailure { not_succeeded }
        };

        Self {
            run_id,
            status,
            tasks,
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overall = if self.is_success() {
            "success"
        } else {
            "partial failure"
        };
        writeln!(f, "run #{}: {}", self.run_id, overall)?;

        for task in &self.tasks {
            write!(
                f,
                "  {:<20} {:<9} attempts={}",
                task.name, task.status, task.attempts
            )?;
            if let Some(err) = &task.last_error {
                write!(f, "  ({err})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
