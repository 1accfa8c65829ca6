// src/lib.rs

//! `dagrun`: a minimal directed-acyclic-task orchestration engine.
//!
//! The library accepts a validated task [`Graph`], schedules ready tasks
//! respecting dependencies on a bounded worker pool, retries failures per
//! policy, and reports terminal pipeline status as a [`RunReport`]. The
//! binary in `main.rs` is a thin caller that loads a TOML pipeline of shell
//! commands and runs it once.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod state;

use std::num::NonZeroUsize;

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::engine::{cancellation, RunReport, Scheduler};

pub use crate::engine::{PipelineStatus, TaskReport};
pub use crate::graph::{Backoff, Graph, GraphBuilder, RetryPolicy, Task, TaskName};
pub use crate::state::TaskStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline loading + validation
/// - scheduler construction
/// - Ctrl-C → run cancellation
///
/// Returns the final [`RunReport`] (or `None` for `--dry-run`); the caller
/// decides the process exit code.
pub async fn run(args: CliArgs) -> Result<Option<RunReport>> {
    let (file_concurrency, graph) = load_and_validate(&args.config)?;

    let concurrency = match args.concurrency {
        Some(n) => NonZeroUsize::new(n)
            .ok_or_else(|| anyhow::anyhow!("--concurrency must be >= 1 (got 0)"))?,
        None => file_concurrency,
    };

    if args.dry_run {
        print_dry_run(&graph, concurrency);
        return Ok(None);
    }

    let mut scheduler = Scheduler::new(graph);

    // Ctrl-C → run-level cancellation.
    let (cancel_handle, cancel_token) = cancellation();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl-C received; cancelling run");
        cancel_handle.cancel();
    });

    let report = scheduler.run_with_cancel(concurrency, cancel_token).await?;

    print!("{report}");
    Ok(Some(report))
}

/// Simple dry-run output: print tasks, deps and retry settings.
fn print_dry_run(graph: &Graph, concurrency: NonZeroUsize) {
    println!("dagrun dry-run");
    println!("  concurrency = {concurrency}");
    println!();

    println!("tasks ({}):", graph.len());
    for task in graph.tasks() {
        println!("  - {}", task.name());
        if !task.dependencies().is_empty() {
            println!("      after: {:?}", task.dependencies());
        }
        if task.retry_policy().max_attempts() > 1 {
            println!("      max_attempts: {}", task.retry_policy().max_attempts());
        }
    }
}
