// src/config/mod.rs

//! TOML pipeline definitions for the CLI.
//!
//! - [`model`] is the serde mapping of the pipeline file.
//! - [`loader`] reads a file and converts it into a validated
//!   [`Graph`](crate::graph::Graph) of shell-command tasks.

pub mod loader;
pub mod model;

pub use loader::{load_and_validate, load_from_path};
pub use model::{PipelineFile, PipelineSection, TaskSection};
