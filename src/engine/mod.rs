// src/engine/mod.rs

//! The orchestration engine.
//!
//! - [`scheduler`] contains the control loop: eligibility recomputation,
//!   bounded dispatch, retry handling and terminal-status reporting.
//! - [`report`] defines the [`RunReport`] returned when a run terminates.
//! - [`cancel`] provides run-level cancellation.

pub mod cancel;
pub mod report;
pub mod scheduler;

pub use cancel::{cancellation, CancelHandle, CancelToken};
pub use report::{PipelineStatus, RunReport, TaskFailure, TaskReport};
pub use scheduler::Scheduler;
