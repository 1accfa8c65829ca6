// src/graph/builder.rs

//! Fluent construction of task graphs.

use crate::errors::ValidationError;
use crate::graph::{validate, Graph, Task};

/// Collects task definitions and validates them into a [`Graph`].
///
/// ```
/// use dagrun::exec::action_fn;
/// use dagrun::graph::{GraphBuilder, Task};
///
/// let graph = GraphBuilder::new()
///     .add(Task::new("ingest", action_fn(|_| async { Ok(()) })))
///     .add(Task::new("validate", action_fn(|_| async { Ok(()) })).after("ingest"))
///     .build()?;
/// # Ok::<(), dagrun::errors::ValidationError>(())
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    tasks: Vec<Task>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a task. Declaration order is preserved and determines dispatch
    /// tie-breaking.
    pub fn add(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Validate the collected tasks and produce an immutable [`Graph`].
    ///
    /// Checks run in order: duplicate names, unknown dependencies, cycles.
    pub fn build(self) -> Result<Graph, ValidationError> {
        validate::validate(self.tasks)
    }
}
