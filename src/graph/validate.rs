// src/graph/validate.rs

//! Graph validation: duplicate names, unknown dependencies, cycles.

use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::errors::ValidationError;
use crate::graph::{Graph, Task, TaskName};

/// Validate a task set and build the immutable [`Graph`].
///
/// Pure function over the input; checks run in a fixed order so error
/// reporting is deterministic:
/// 1. name uniqueness
/// 2. dependency existence
/// 3. acyclicity (a self-dependency is a cycle of length one)
pub(crate) fn validate(tasks: Vec<Task>) -> Result<Graph, ValidationError> {
    let mut index: HashMap<TaskName, usize> = HashMap::new();
    for (i, task) in tasks.iter().enumerate() {
        if index.insert(task.name.clone(), i).is_some() {
            return Err(ValidationError::DuplicateTask(task.name.clone()));
        }
    }

    for task in &tasks {
        for dep in &task.deps {
            if !index.contains_key(dep) {
                return Err(ValidationError::UnknownDependency {
                    task: task.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    // Edge direction: dependency -> dependent.
    let mut edges: DiGraphMap<usize, ()> = DiGraphMap::new();
    for i in 0..tasks.len() {
        edges.add_node(i);
    }
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.deps {
            let dep_idx = index[dep];
            edges.add_edge(dep_idx, i, ());
        }
    }

    if let Some(cycle) = find_cycle(&tasks, &edges) {
        return Err(ValidationError::CycleDetected(cycle));
    }

    Ok(Graph::new_unchecked(tasks, index, edges))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// On the current DFS recursion stack.
    InStack,
    Done,
}

/// Depth-first cycle search. Returns the names of every task on the first
/// cycle found, in dependency order.
fn find_cycle(tasks: &[Task], edges: &DiGraphMap<usize, ()>) -> Option<Vec<TaskName>> {
    let mut marks = vec![Mark::Unvisited; tasks.len()];
    let mut stack: Vec<usize> = Vec::new();

    for root in 0..tasks.len() {
        if marks[root] == Mark::Unvisited {
            if let Some(cycle) = dfs(root, tasks, edges, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }

    None
}

fn dfs(
    node: usize,
    tasks: &[Task],
    edges: &DiGraphMap<usize, ()>,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
) -> Option<Vec<TaskName>> {
    marks[node] = Mark::InStack;
    stack.push(node);

    for next in edges.neighbors_directed(node, Direction::Outgoing) {
        match marks[next] {
            Mark::InStack => {
                // The cycle is the stack suffix starting at `next`.
                let start = stack
                    .iter()
                    .position(|&n| n == next)
                    .expect("InStack node must be on the stack");
                return Some(
                    stack[start..]
                        .iter()
                        .map(|&i| tasks[i].name.clone())
                        .collect(),
                );
            }
            Mark::Unvisited => {
                if let Some(cycle) = dfs(next, tasks, edges, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node] = Mark::Done;
    None
}
