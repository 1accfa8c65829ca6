// src/state/status.rs

//! Task state machine and failure reasons.

use std::fmt;

/// Status of a single task within one run.
///
/// `Succeeded`, `Failed` and `Skipped` are terminal; no further transitions
/// happen once a task reaches one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Waiting for dependencies to reach a terminal state.
    Pending,
    /// All dependencies succeeded; eligible for dispatch.
    Ready,
    /// Dispatched to the executor (also covers the backoff window between
    /// a failed attempt and its retry).
    Running,
    Succeeded,
    Failed,
    /// Never ran: an upstream dependency failed or the run was cancelled.
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Whether the state machine permits `self -> next`.
    ///
    /// `Ready -> Skipped` and `Running -> Skipped` exist only for run-level
    /// cancellation; `Running -> Ready` is the retry edge.
    pub(crate) fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Ready | Skipped)
                | (Ready, Running | Skipped)
                | (Running, Succeeded | Failed | Ready | Skipped)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Why a task attempt (or the task as a whole) did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The action itself returned an error.
    Action(String),
    /// One attempt exceeded the task's configured timeout.
    Timeout,
    /// The action panicked; the panic was contained by the executor.
    Panicked(String),
    /// The run was cancelled while this task was in flight or queued.
    Cancelled,
    /// A dependency ended `Failed` or `Skipped`, so this task never ran.
    UpstreamFailed(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Action(msg) => write!(f, "action failed: {msg}"),
            FailureReason::Timeout => write!(f, "attempt timed out"),
            FailureReason::Panicked(msg) => write!(f, "action panicked: {msg}"),
            FailureReason::Cancelled => write!(f, "run cancelled"),
            FailureReason::UpstreamFailed(dep) => {
                write!(f, "upstream task '{dep}' did not succeed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        use TaskStatus::*;
        for from in [Succeeded, Failed, Skipped] {
            for to in [Pending, Ready, Running, Succeeded, Failed, Skipped] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn retry_edge_is_legal() {
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Ready));
    }

    #[test]
    fn pending_cannot_run_directly() {
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Running));
    }
}
