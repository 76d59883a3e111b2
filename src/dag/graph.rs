// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::plan::Plan;
use crate::types::TaskKind;

/// Direct dependents of a task: tasks that wait for it.
#[derive(Debug, Clone, Default)]
struct DagNode {
    dependents: Vec<TaskKind>,
}

/// In-memory DAG representation keyed by task.
///
/// Acyclicity is already checked by [`Plan::new`]; dependencies live in
/// each task's `TaskInfo`, so only the reverse edges are kept here.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<TaskKind, DagNode>,
}

impl DagGraph {
    pub fn from_plan(plan: &Plan) -> Self {
        let mut nodes: HashMap<TaskKind, DagNode> = HashMap::new();

        for node in plan.nodes() {
            nodes.insert(node.task, DagNode::default());
        }

        for node in plan.nodes() {
            for dep in &node.after {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(node.task);
                }
            }
        }

        Self { nodes }
    }

    /// All tasks in the graph.
    pub fn tasks(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.nodes.keys().copied()
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, task: TaskKind) -> &[TaskKind] {
        self.nodes
            .get(&task)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
