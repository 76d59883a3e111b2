// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::types::TaskKind;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskKind, TaskInfo>,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskKind, TaskInfo>,
        run_id: u64,
    ) -> Self {
        Self {
            graph,
            tasks,
            run_id,
        }
    }

    /// Mark every non-terminal dependent (transitively) of a failed task as
    /// `DoneFailed`.
    ///
    /// Returns the tasks newly marked as failed, excluding the root task.
    pub fn mark_dependents_failed(&mut self, failed_task: TaskKind) -> Vec<TaskKind> {
        let mut stack: Vec<TaskKind> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(task) = stack.pop() {
            let Some(info) = self.tasks.get_mut(&task) else {
                continue;
            };
            match info.run_state {
                RunState::Pending | RunState::Running => {
                    info.run_state = RunState::DoneFailed;
                    debug!(
                        task = %task,
                        "marking dependent as DoneFailed due to upstream failure"
                    );
                    newly_failed.push(task);
                    stack.extend(self.graph.dependents_of(task).iter().copied());
                }
                RunState::DoneSuccess | RunState::DoneFailed | RunState::Cancelled => {}
            }
        }

        newly_failed
    }

    /// Cancel everything still outstanding in this run.
    ///
    /// Pending tasks become `Cancelled` without ever running. Running tasks
    /// also become `Cancelled` and are returned so the executor can stop them.
    pub fn cancel_outstanding(&mut self) -> Vec<TaskKind> {
        let mut running = Vec::new();
        for info in self.tasks.values_mut() {
            match info.run_state {
                RunState::Pending => {
                    debug!(task = %info.task, "cancelling pending task");
                    info.run_state = RunState::Cancelled;
                }
                RunState::Running => {
                    debug!(task = %info.task, "cancelling running task");
                    info.run_state = RunState::Cancelled;
                    running.push(info.task);
                }
                _ => {}
            }
        }
        running.sort();
        running
    }

    /// Whether all dependencies of the given task succeeded in this run.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        ReadOnlyStateManager::new(self.tasks).deps_satisfied_for_info(info)
    }

    /// Collect tasks that are `Pending` and whose dependencies are satisfied,
    /// mark them as `Running`, and return them as `ScheduledTask`s.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        // Decide first, then mutate.
        let mut candidates: Vec<TaskKind> = self
            .tasks
            .values()
            .filter(|info| {
                info.run_state == RunState::Pending && self.deps_satisfied_for_info(info)
            })
            .map(|info| info.task)
            .collect();
        // Stable dispatch order keeps logs and tests deterministic.
        candidates.sort();

        let mut ready = Vec::with_capacity(candidates.len());
        for task in candidates {
            if let Some(info) = self.tasks.get_mut(&task) {
                info!(task = %task, run_id = self.run_id, "scheduling task");
                info.run_state = RunState::Running;
                ready.push(ScheduledTask {
                    task,
                    run_id: self.run_id,
                });
            }
        }

        ready
    }
}

/// A read-only view used when only shared access to the tasks map is available.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskKind, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskKind, TaskInfo>) -> Self {
        Self { tasks }
    }

    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep| match self.tasks.get(dep) {
            Some(dep_info) => dep_info.run_state == RunState::DoneSuccess,
            None => {
                warn!(task = %info.task, dep = %dep, "dependency missing from tasks map");
                false
            }
        })
    }
}
