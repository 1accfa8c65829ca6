// src/state/mod.rs

//! Per-run task state.
//!
//! - [`status`] defines the task state machine ([`TaskStatus`]) and the
//!   failure vocabulary ([`FailureReason`]).
//! - [`store`] holds one [`TaskRunState`] per task for a single run and
//!   enforces transition legality.

pub mod status;
pub mod store;

pub use status::{FailureReason, TaskStatus};
pub use store::{RunStateStore, TaskRunState, TaskSnapshot};
