// tests/retries.rs

//! Retry policy: attempt counting, backoff, eventual success.

use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

use dagrun::engine::{PipelineStatus, Scheduler};
use dagrun::graph::{Backoff, GraphBuilder, RetryPolicy, Task};
use dagrun::state::{FailureReason, TaskStatus};
use dagrun_test_utils::actions::{failing_action, flaky_action, ok_action};
use dagrun_test_utils::{init_tracing, with_timeout};

fn attempts(n: u32) -> RetryPolicy {
    RetryPolicy::new(NonZeroU32::new(n).unwrap(), Backoff::None)
}

#[tokio::test]
async fn always_failing_task_runs_exactly_max_attempts_times() {
    init_tracing();

    let graph = GraphBuilder::new()
        .add(Task::new("doomed", failing_action("nope")).retry(attempts(3)))
        .build()
        .unwrap();

    let mut scheduler = Scheduler::new(graph);
    let report = with_timeout(scheduler.run(NonZeroUsize::MIN)).await.unwrap();

    let task = report.task("doomed").unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.attempts, 3);
    match &task.last_error {
        Some(FailureReason::Action(msg)) => assert!(msg.contains("nope")),
        other => panic!("unexpected error: {other:?}"),
    }

    match &report.status {
        PipelineStatus::PartialFailure { not_succeeded } => {
            assert_eq!(not_succeeded.len(), 1);
            assert_eq!(not_succeeded[0].task, "doomed");
        }
        PipelineStatus::Success => panic!("pipeline must not be a success"),
    }
}

#[tokio::test]
async fn flaky_task_succeeds_after_retries() {
    init_tracing();

    let graph = GraphBuilder::new()
        .add(Task::new("flaky", flaky_action(2)).retry(attempts(5)))
        .add(Task::new("after", ok_action()).after("flaky"))
        .build()
        .unwrap();

    let mut scheduler = Scheduler::new(graph);
    let report = with_timeout(scheduler.run(NonZeroUsize::MIN)).await.unwrap();

    assert!(report.is_success());
    let flaky = report.task("flaky").unwrap();
    assert_eq!(flaky.status, TaskStatus::Succeeded);
    assert_eq!(flaky.attempts, 3);
    assert_eq!(flaky.last_error, None, "success clears earlier failures");
    assert_eq!(report.task("after").unwrap().status, TaskStatus::Succeeded);
}

#[tokio::test(start_paused = true)]
async fn fixed_backoff_delays_each_retry() {
    init_tracing();

    let backoff = Duration::from_millis(500);
    let graph = GraphBuilder::new()
        .add(
            Task::new("doomed", failing_action("nope")).retry(RetryPolicy::new(
                NonZeroU32::new(3).unwrap(),
                Backoff::Fixed(backoff),
            )),
        )
        .build()
        .unwrap();

    let started = tokio::time::Instant::now();
    let mut scheduler = Scheduler::new(graph);
    let report = scheduler.run(NonZeroUsize::MIN).await.unwrap();

    assert_eq!(report.task("doomed").unwrap().attempts, 3);
    // Two backoff windows: after attempt 1 and after attempt 2.
    assert!(started.elapsed() >= backoff * 2);
}

#[tokio::test]
async fn retrying_task_does_not_hold_a_worker_slot_during_backoff() {
    init_tracing();

    // One worker slot. While `doomed` waits out its (long, paused-free)
    // backoff the slot must be free for `other` to run.
    let graph = GraphBuilder::new()
        .add(
            Task::new("doomed", failing_action("nope")).retry(RetryPolicy::new(
                NonZeroU32::new(2).unwrap(),
                Backoff::Fixed(Duration::from_millis(50)),
            )),
        )
        .add(Task::new("other", ok_action()))
        .build()
        .unwrap();

    let mut scheduler = Scheduler::new(graph);
    let report = with_timeout(scheduler.run(NonZeroUsize::MIN)).await.unwrap();

    assert_eq!(report.task("other").unwrap().status, TaskStatus::Succeeded);
    assert_eq!(report.task("doomed").unwrap().status, TaskStatus::Failed);

    // `other` ran while `doomed` was in backoff, not after it failed.
    let other_finished = report.task("other").unwrap().finished_at.unwrap();
    let doomed_finished = report.task("doomed").unwrap().finished_at.unwrap();
    assert!(other_finished <= doomed_finished);
}
