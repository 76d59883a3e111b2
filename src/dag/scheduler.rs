// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::plan::Plan;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::TaskOutcome;
use crate::types::{FailurePolicy, TaskKind};

/// Scheduler holds the immutable plan graph plus mutable per-run state.
///
/// It is responsible for:
/// - deciding when a task is ready to run (all deps succeeded)
/// - marking tasks as succeeded or failed
/// - failing dependents when a task fails
/// - applying the [`FailurePolicy`] to the rest of the run
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskKind, TaskInfo>,
    policy: FailurePolicy,
    run_id: u64,
    started: bool,
    finished: bool,
}

impl Scheduler {
    /// Construct a scheduler for a validated [`Plan`].
    pub fn from_plan(plan: &Plan, policy: FailurePolicy) -> Self {
        let graph = DagGraph::from_plan(plan);
        let tasks = plan
            .nodes()
            .iter()
            .map(|node| (node.task, TaskInfo::new(node.task, node.after.clone())))
            .collect();

        Self {
            graph,
            tasks,
            policy,
            run_id: 1,
            started: false,
            finished: false,
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Whether every task has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: TaskKind) -> Option<TaskRunState> {
        self.tasks.get(&task).map(|info| info.run_state.into())
    }

    /// Whether the dependencies of `task` have all succeeded.
    ///
    /// Returns `None` if the task is not part of the plan.
    pub fn deps_satisfied(&self, task: TaskKind) -> Option<bool> {
        let info = self.tasks.get(&task)?;
        Some(ReadOnlyStateManager::new(&self.tasks).deps_satisfied_for_info(info))
    }

    /// Tasks of the plan, sorted.
    pub fn tasks(&self) -> Vec<TaskKind> {
        let mut tasks: Vec<TaskKind> = self.graph.tasks().collect();
        tasks.sort();
        tasks
    }

    /// Tasks that ended in `DoneFailed`, sorted.
    pub fn failed_tasks(&self) -> Vec<TaskKind> {
        self.tasks_in_state(RunState::DoneFailed)
    }

    /// Tasks that ended in `Cancelled`, sorted.
    pub fn cancelled_tasks(&self) -> Vec<TaskKind> {
        self.tasks_in_state(RunState::Cancelled)
    }

    /// Start the run: schedule every task without dependencies.
    pub fn start(&mut self) -> SchedulerStep {
        if self.started {
            warn!(run_id = self.run_id, "scheduler already started; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;
        debug!(run_id = self.run_id, "scheduler: starting run");

        let newly_scheduled = self.manager().collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            run_just_finished,
            ..SchedulerStep::default()
        }
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn step_completion(&mut self, task: TaskKind, outcome: TaskOutcome) -> SchedulerStep {
        let Some(info) = self.tasks.get_mut(&task) else {
            warn!(task = %task, "completion for task outside the plan; ignoring");
            return SchedulerStep::default();
        };

        if info.run_state != RunState::Running {
            // Late completion of a task that was already cancelled or failed.
            debug!(
                task = %task,
                state = ?info.run_state,
                "completion for task that is not running; ignoring"
            );
            return SchedulerStep::default();
        }

        let mut step = SchedulerStep::default();
        let run_id = self.run_id;

        match outcome {
            TaskOutcome::Success => {
                info.run_state = RunState::DoneSuccess;
                debug!(task = %task, run_id, "task completed successfully");
                step.newly_scheduled = self.manager().collect_new_ready_tasks();
            }
            TaskOutcome::Failed(message) => {
                info.run_state = RunState::DoneFailed;
                warn!(
                    task = %task,
                    run_id,
                    error = %message,
                    "task failed; failing dependents in this run"
                );
                step.newly_failed.push(task);
                let mut manager = self.manager();
                step.newly_failed.extend(manager.mark_dependents_failed(task));

                match self.policy {
                    FailurePolicy::Cancel => {
                        step.to_cancel = self.manager().cancel_outstanding();
                        if !step.to_cancel.is_empty() {
                            info!(
                                run_id,
                                tasks = ?step.to_cancel,
                                "cancelling running siblings after failure"
                            );
                        }
                    }
                    FailurePolicy::Wait => {
                        // Independent siblings keep going and may still
                        // unlock their own dependents.
                        step.newly_scheduled = self.manager().collect_new_ready_tasks();
                    }
                }
            }
        }

        step.run_just_finished = self.maybe_finish_run();
        step
    }

    /// Cancel the whole run (shutdown). Returns the running tasks to stop.
    pub fn cancel_all(&mut self) -> Vec<TaskKind> {
        let running = self.manager().cancel_outstanding();
        self.maybe_finish_run();
        running
    }

    /// Task kinds of a batch of scheduled tasks.
    pub fn scheduled_names(tasks: &[ScheduledTask]) -> Vec<TaskKind> {
        tasks.iter().map(|t| t.task).collect()
    }

    fn manager(&mut self) -> StateManager<'_> {
        StateManager::new(&self.graph, &mut self.tasks, self.run_id)
    }

    fn tasks_in_state(&self, state: RunState) -> Vec<TaskKind> {
        let mut out: Vec<TaskKind> = self
            .tasks
            .values()
            .filter(|info| info.run_state == state)
            .map(|info| info.task)
            .collect();
        out.sort();
        out
    }

    /// Returns `true` if this call transitioned the run to finished.
    fn maybe_finish_run(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let all_terminal = self.tasks.values().all(|info| info.run_state.is_terminal());
        if all_terminal {
            info!(run_id = self.run_id, "scheduler: all tasks terminal; run finished");
            self.finished = true;
        }
        all_terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(step: &SchedulerStep) -> Vec<TaskKind> {
        Scheduler::scheduled_names(&step.newly_scheduled)
    }

    #[test]
    fn bundle_waits_for_every_transform() {
        let mut sched = Scheduler::from_plan(&Plan::bundle(), FailurePolicy::Cancel);
        let start = sched.start();
        assert_eq!(names(&start).len(), 5);
        assert!(!names(&start).contains(&TaskKind::Compress));

        let transforms = TaskKind::TRANSFORMS;
        for (i, task) in transforms.iter().enumerate() {
            let step = sched.step_completion(*task, TaskOutcome::Success);
            if i + 1 < transforms.len() {
                assert!(step.newly_scheduled.is_empty());
            } else {
                assert_eq!(names(&step), vec![TaskKind::Compress]);
            }
        }

        let last = sched.step_completion(TaskKind::Compress, TaskOutcome::Success);
        assert!(last.run_just_finished);
        assert!(sched.failed_tasks().is_empty());
    }

    #[test]
    fn cancel_policy_stops_siblings_and_fails_dependents() {
        let mut sched = Scheduler::from_plan(&Plan::bundle(), FailurePolicy::Cancel);
        sched.start();

        let step = sched.step_completion(TaskKind::Images, TaskOutcome::Failed("boom".into()));
        assert_eq!(step.newly_failed, vec![TaskKind::Images, TaskKind::Compress]);
        assert_eq!(step.to_cancel.len(), 4);
        assert!(step.run_just_finished);
        assert_eq!(
            sched.run_state_of(TaskKind::Styles),
            Some(TaskRunState::Cancelled)
        );

        // A late completion from a cancelled task is ignored.
        let late = sched.step_completion(TaskKind::Styles, TaskOutcome::Success);
        assert!(late.newly_scheduled.is_empty());
        assert!(!late.run_just_finished);
    }

    #[test]
    fn wait_policy_lets_siblings_finish() {
        let mut sched = Scheduler::from_plan(&Plan::build(), FailurePolicy::Wait);
        sched.start();

        let step = sched.step_completion(TaskKind::Styles, TaskOutcome::Failed("bad css".into()));
        assert!(step.to_cancel.is_empty());
        assert!(!step.run_just_finished);

        for task in [
            TaskKind::Images,
            TaskKind::Scripts,
            TaskKind::CopyAssets,
            TaskKind::CopyCss,
        ] {
            sched.step_completion(task, TaskOutcome::Success);
        }

        assert!(sched.is_finished());
        assert_eq!(sched.failed_tasks(), vec![TaskKind::Styles]);
    }

    #[test]
    fn cancel_all_marks_pending_and_running() {
        let mut sched = Scheduler::from_plan(&Plan::dev(), FailurePolicy::Cancel);
        sched.start();
        let running = sched.cancel_all();
        assert_eq!(running.len(), 5);
        assert!(sched.is_finished());
        assert_eq!(
            sched.run_state_of(TaskKind::Monitor),
            Some(TaskRunState::Cancelled)
        );
    }
}
