// src/dag/plan.rs

//! Named execution plans: the composite orchestrations as explicit DAGs.
//!
//! | entry point         | plan                                              |
//! |---------------------|---------------------------------------------------|
//! | `build`             | styles, js, images, copyAssets, copyCss (parallel) |
//! | `dev` / `default`   | build group -> serve -> monitor                   |
//! | `bundle`            | build group -> compress                           |
//! | any single task     | that task alone                                   |

use std::collections::HashSet;
use std::str::FromStr;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{PipelineError, Result};
use crate::types::TaskKind;

/// A node of a plan: a task plus the tasks it waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    pub task: TaskKind,
    pub after: Vec<TaskKind>,
}

impl PlanNode {
    pub fn new(task: TaskKind) -> Self {
        Self {
            task,
            after: Vec::new(),
        }
    }

    pub fn after(task: TaskKind, deps: &[TaskKind]) -> Self {
        Self {
            task,
            after: deps.to_vec(),
        }
    }
}

/// Validated, acyclic task graph with a name.
#[derive(Debug, Clone)]
pub struct Plan {
    name: String,
    nodes: Vec<PlanNode>,
}

impl Plan {
    /// Build a plan, checking for duplicate tasks, unknown or self
    /// dependencies, and cycles.
    pub fn new(name: impl Into<String>, nodes: Vec<PlanNode>) -> Result<Self> {
        let name = name.into();
        let mut known = HashSet::new();
        for node in &nodes {
            if !known.insert(node.task) {
                return Err(PipelineError::ConfigError(format!(
                    "plan '{name}' lists task '{}' twice",
                    node.task
                )));
            }
        }

        for node in &nodes {
            for dep in &node.after {
                if *dep == node.task {
                    return Err(PipelineError::ConfigError(format!(
                        "task '{}' cannot depend on itself in plan '{name}'",
                        node.task
                    )));
                }
                if !known.contains(dep) {
                    return Err(PipelineError::ConfigError(format!(
                        "task '{}' has unknown dependency '{}' in plan '{name}'",
                        node.task, dep
                    )));
                }
            }
        }

        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<TaskKind, ()> = DiGraphMap::new();
        for node in &nodes {
            graph.add_node(node.task);
        }
        for node in &nodes {
            for dep in &node.after {
                graph.add_edge(*dep, node.task, ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(PipelineError::ConfigError(format!(
                "cycle detected in plan '{name}' involving task '{}'",
                cycle.node_id()
            )));
        }

        Ok(Self { name, nodes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn contains(&self, task: TaskKind) -> bool {
        self.nodes.iter().any(|n| n.task == task)
    }

    /// A plan with one task and no dependencies.
    pub fn single(task: TaskKind) -> Self {
        Self {
            name: task.name().to_string(),
            nodes: vec![PlanNode::new(task)],
        }
    }

    /// The five transform tasks in parallel.
    pub fn build() -> Self {
        Self {
            name: "build".to_string(),
            nodes: build_group(),
        }
    }

    /// Build, then start the server, then monitor.
    pub fn dev() -> Self {
        let mut nodes = build_group();
        nodes.push(PlanNode::after(TaskKind::Serve, &TaskKind::TRANSFORMS));
        nodes.push(PlanNode::after(TaskKind::Monitor, &[TaskKind::Serve]));
        Self {
            name: "dev".to_string(),
            nodes,
        }
    }

    /// Build, then package the output tree.
    pub fn bundle() -> Self {
        let mut nodes = build_group();
        nodes.push(PlanNode::after(TaskKind::Compress, &TaskKind::TRANSFORMS));
        Self {
            name: "bundle".to_string(),
            nodes,
        }
    }

    /// Resolve a CLI entry point name.
    pub fn for_entry_point(entry: &str) -> Result<Self> {
        match entry.trim() {
            "build" => Ok(Plan::build()),
            "dev" | "default" => Ok(Plan::dev()),
            "bundle" => Ok(Plan::bundle()),
            other => TaskKind::from_str(other)
                .map(Plan::single)
                .map_err(PipelineError::ConfigError),
        }
    }
}

fn build_group() -> Vec<PlanNode> {
    TaskKind::TRANSFORMS.iter().copied().map(PlanNode::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_plans_are_valid() {
        for plan in [Plan::build(), Plan::dev(), Plan::bundle()] {
            let nodes = plan.nodes().to_vec();
            assert!(Plan::new(plan.name(), nodes).is_ok(), "{}", plan.name());
        }
    }

    #[test]
    fn default_is_dev() {
        let plan = Plan::for_entry_point("default").unwrap();
        assert_eq!(plan.name(), "dev");
        assert!(plan.contains(TaskKind::Monitor));
    }

    #[test]
    fn unknown_entry_point_is_rejected() {
        assert!(Plan::for_entry_point("deploy").is_err());
    }

    #[test]
    fn cycle_is_rejected() {
        let nodes = vec![
            PlanNode::after(TaskKind::Styles, &[TaskKind::Scripts]),
            PlanNode::after(TaskKind::Scripts, &[TaskKind::Styles]),
        ];
        match Plan::new("loop", nodes) {
            Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("cycle detected")),
            other => panic!("expected cycle error, got {other:?}"),
        }
    }
}
