//! Ready-made graph shapes used across tests.

use dagrun::graph::{Graph, GraphBuilder, Task};

use crate::actions::ok_action;

/// Linear chain of always-succeeding tasks, in the given order.
pub fn chain(names: &[&str]) -> Graph {
    let mut builder = GraphBuilder::new();
    let mut prev: Option<&str> = None;
    for name in names {
        let mut task = Task::new(*name, ok_action());
        if let Some(dep) = prev {
            task = task.after(dep);
        }
        builder = builder.add(task);
        prev = Some(name);
    }
    builder.build().expect("chain must be a valid DAG")
}

/// Diamond: `a -> {b, c} -> d`, all tasks succeed.
pub fn diamond() -> Graph {
    GraphBuilder::new()
        .add(Task::new("a", ok_action()))
        .add(Task::new("b", ok_action()).after("a"))
        .add(Task::new("c", ok_action()).after("a"))
        .add(Task::new("d", ok_action()).after("b").after("c"))
        .build()
        .expect("diamond must be a valid DAG")
}
