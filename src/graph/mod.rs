// src/graph/mod.rs

//! Task graph construction and validation.
//!
//! - [`task`] defines [`Task`], [`RetryPolicy`] and [`Backoff`].
//! - [`builder`] provides the [`GraphBuilder`] entry point.
//! - [`validate`] checks the task set forms a valid DAG and produces the
//!   immutable [`Graph`].

pub mod builder;
pub mod task;
pub mod validate;

pub use builder::GraphBuilder;
pub use task::{Backoff, RetryPolicy, Task, TaskName};

use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

/// An immutable, validated set of tasks.
///
/// Declaration order is preserved and is the tie-break order for dispatch.
/// Any later change goes through building a new `Graph`.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Tasks in declaration order.
    tasks: Vec<Task>,
    index: HashMap<TaskName, usize>,
    /// Edge direction: dependency -> dependent.
    edges: DiGraphMap<usize, ()>,
}

impl Graph {
    pub(crate) fn new_unchecked(
        tasks: Vec<Task>,
        index: HashMap<TaskName, usize>,
        edges: DiGraphMap<usize, ()>,
    ) -> Self {
        Self {
            tasks,
            index,
            edges,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub(crate) fn task_at(&self, idx: usize) -> &Task {
        &self.tasks[idx]
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Immediate dependencies of the task at `idx`.
    pub(crate) fn dep_indices(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.neighbors_directed(idx, Direction::Incoming)
    }

    /// Immediate dependencies of a task, by name.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        match self.index_of(name) {
            Some(idx) => self
                .dep_indices(idx)
                .map(|i| self.tasks[i].name())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Immediate dependents of a task, by name.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        match self.index_of(name) {
            Some(idx) => self
                .edges
                .neighbors_directed(idx, Direction::Outgoing)
                .map(|i| self.tasks[i].name())
                .collect(),
            None => Vec::new(),
        }
    }
}
