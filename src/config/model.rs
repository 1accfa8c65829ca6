// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level pipeline definition as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// concurrency = 2
///
/// [task.ingest]
/// cmd = "cp data/raw/orders.csv work/processed/"
///
/// [task.validate]
/// cmd = "scripts/check.sh work/processed/orders.csv"
/// after = ["ingest"]
/// max_attempts = 3
/// backoff_ms = 500
/// timeout_ms = 30000
/// ```
///
/// Task keys are the task names; the `[pipeline]` section is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineFile {
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskSection>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Maximum number of tasks running at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSection {
    /// The command to execute.
    pub cmd: String,

    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Total attempts allowed, including the first (must be >= 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts; omit for immediate retry.
    #[serde(default)]
    pub backoff_ms: Option<u64>,

    /// Maximum duration of one attempt; omit for no limit.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    1
}
