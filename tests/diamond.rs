// tests/diamond.rs

//! Diamond graph: a -> {b, c} -> d.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use dagrun::engine::Scheduler;
use dagrun::exec::{action_fn, TaskAction};
use dagrun::graph::{GraphBuilder, Task};
use dagrun::state::TaskStatus;
use dagrun_test_utils::actions::{failing_action, ok_action};
use dagrun_test_utils::graphs::diamond;
use dagrun_test_utils::recorder::RecordingExecutor;
use dagrun_test_utils::{init_tracing, with_timeout};

/// Action that logs `<task>:start` and `<task>:end` around a yield, so tests
/// can observe interleaving (or its absence).
fn span_action(log: Arc<Mutex<Vec<String>>>) -> Arc<dyn TaskAction> {
    action_fn(move |ctx| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("{}:start", ctx.task));
            tokio::task::yield_now().await;
            log.lock().unwrap().push(format!("{}:end", ctx.task));
            Ok(())
        }
    })
}

#[tokio::test]
async fn join_waits_for_both_branches() {
    init_tracing();

    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let mut scheduler = Scheduler::with_executor(
        diamond(),
        Arc::new(RecordingExecutor::new(dispatched.clone())),
    );

    let report = with_timeout(scheduler.run(NonZeroUsize::new(2).unwrap()))
        .await
        .unwrap();

    assert!(report.is_success());

    // d is dispatched last, and only after both b and c finished.
    assert_eq!(*dispatched.lock().unwrap(), ["a", "b", "c", "d"]);
    let d = report.task("d").unwrap();
    let b = report.task("b").unwrap();
    let c = report.task("c").unwrap();
    assert!(d.started_at.unwrap() >= b.finished_at.unwrap());
    assert!(d.started_at.unwrap() >= c.finished_at.unwrap());
}

#[tokio::test]
async fn concurrency_one_runs_branches_sequentially_in_declaration_order() {
    init_tracing();

    let log = Arc::new(Mutex::new(Vec::new()));
    let graph = GraphBuilder::new()
        .add(Task::new("a", span_action(log.clone())))
        .add(Task::new("b", span_action(log.clone())).after("a"))
        .add(Task::new("c", span_action(log.clone())).after("a"))
        .add(Task::new("d", span_action(log.clone())).after("b").after("c"))
        .build()
        .unwrap();

    let mut scheduler = Scheduler::new(graph);
    let report = with_timeout(scheduler.run(NonZeroUsize::MIN)).await.unwrap();
    assert!(report.is_success());

    // With one worker slot there is no interleaving: each task fully
    // finishes before the next one starts, b strictly before c.
    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "a:start", "a:end", "b:start", "b:end", "c:start", "c:end", "d:start", "d:end",
        ]
    );
}

#[tokio::test]
async fn one_failed_branch_skips_only_the_join() {
    init_tracing();

    let graph = GraphBuilder::new()
        .add(Task::new("a", ok_action()))
        .add(Task::new("b", ok_action()).after("a"))
        .add(Task::new("c", failing_action("branch failed")).after("a"))
        .add(Task::new("d", ok_action()).after("b").after("c"))
        .build()
        .unwrap();

    let mut scheduler = Scheduler::new(graph);
    let report = with_timeout(scheduler.run(NonZeroUsize::new(2).unwrap()))
        .await
        .unwrap();

    assert_eq!(report.task("a").unwrap().status, TaskStatus::Succeeded);
    assert_eq!(report.task("b").unwrap().status, TaskStatus::Succeeded);
    assert_eq!(report.task("c").unwrap().status, TaskStatus::Failed);
    assert_eq!(report.task("d").unwrap().status, TaskStatus::Skipped);
    assert!(!report.is_success());
}
