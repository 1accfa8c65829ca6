// src/graph/task.rs

//! Task definitions and retry policy.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::exec::TaskAction;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Backoff between failed attempts, as a function of the attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// The same delay after every failed attempt.
    Fixed(Duration),
    /// `initial` after the first failure, doubling per attempt, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay before the retry following the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let exponent = attempt.saturating_sub(1).min(31);
                let factor = 2u32.saturating_pow(exponent);
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// How many times a task may be attempted, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: NonZeroU32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self {
            max_attempts: NonZeroU32::MIN,
            backoff: Backoff::None,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.delay_for(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

/// A named unit of work: an action plus its scheduling metadata.
///
/// Built fluently, then handed to a
/// [`GraphBuilder`](crate::graph::GraphBuilder):
///
/// ```
/// use dagrun::exec::action_fn;
/// use dagrun::graph::Task;
/// use std::time::Duration;
///
/// let task = Task::new("load", action_fn(|_| async { Ok(()) }))
///     .after("transform")
///     .timeout(Duration::from_secs(30));
/// ```
#[derive(Clone)]
pub struct Task {
    pub(crate) name: TaskName,
    pub(crate) deps: Vec<TaskName>,
    pub(crate) action: Arc<dyn TaskAction>,
    pub(crate) retry: RetryPolicy,
    pub(crate) timeout: Option<Duration>,
}

impl Task {
    pub fn new(name: impl Into<TaskName>, action: Arc<dyn TaskAction>) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            action,
            retry: RetryPolicy::once(),
            timeout: None,
        }
    }

    /// Declare that this task runs only after `dep` has succeeded.
    pub fn after(mut self, dep: impl Into<TaskName>) -> Self {
        self.deps.push(dep.into());
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Maximum duration for a single attempt.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[TaskName] {
        &self.deps
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_is_constant() {
        let b = Backoff::Fixed(Duration::from_millis(100));
        assert_eq!(b.delay_for(1), Duration::from_millis(100));
        assert_eq!(b.delay_for(7), Duration::from_millis(100));
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let b = Backoff::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        assert_eq!(b.delay_for(1), Duration::from_millis(100));
        assert_eq!(b.delay_for(2), Duration::from_millis(200));
        assert_eq!(b.delay_for(3), Duration::from_millis(350));
        assert_eq!(b.delay_for(20), Duration::from_millis(350));
    }

    #[test]
    fn exponential_backoff_survives_large_attempt_numbers() {
        let b = Backoff::Exponential {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        };
        assert_eq!(b.delay_for(u32::MAX), Duration::from_secs(60));
    }
}
