// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::info;

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::{RunOutcome, TaskOutcome};
use crate::types::TaskKind;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Stop these running tasks.
    CancelTasks(Vec<TaskKind>),
    /// The plan is over; report this outcome.
    Finish(RunOutcome),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

pub fn handle_start(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.start();
    commands_for_step(scheduler, step)
}

pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    task: TaskKind,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = scheduler.step_completion(task, outcome);
    commands_for_step(scheduler, step)
}

/// Shutdown cancels everything outstanding and ends the run as interrupted.
pub fn handle_shutdown(scheduler: &mut Scheduler) -> CoreStep {
    info!(run_id = scheduler.run_id(), "shutdown requested; cancelling run");
    let running = scheduler.cancel_all();

    let mut commands = Vec::new();
    if !running.is_empty() {
        commands.push(CoreCommand::CancelTasks(running));
    }
    commands.push(CoreCommand::Finish(RunOutcome::Interrupted));

    CoreStep {
        commands,
        keep_running: false,
    }
}

fn commands_for_step(scheduler: &Scheduler, step: SchedulerStep) -> CoreStep {
    let mut commands = Vec::new();

    if !step.to_cancel.is_empty() {
        commands.push(CoreCommand::CancelTasks(step.to_cancel));
    }
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    let mut keep_running = true;
    if step.run_just_finished {
        let failed = scheduler.failed_tasks();
        let outcome = if failed.is_empty() {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed { failed }
        };
        commands.push(CoreCommand::Finish(outcome));
        keep_running = false;
    }

    CoreStep {
        commands,
        keep_running,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Plan;
    use crate::types::FailurePolicy;

    #[test]
    fn single_task_plan_finishes_after_one_completion() {
        let mut sched = Scheduler::from_plan(&Plan::single(TaskKind::Reload), FailurePolicy::Cancel);
        let start = handle_start(&mut sched);
        assert!(start.keep_running);
        assert_eq!(start.commands.len(), 1);

        let done = handle_task_completion(&mut sched, TaskKind::Reload, TaskOutcome::Success);
        assert!(!done.keep_running);
        assert_eq!(done.commands, vec![CoreCommand::Finish(RunOutcome::Succeeded)]);
    }

    #[test]
    fn failure_emits_cancel_before_finish() {
        let mut sched = Scheduler::from_plan(&Plan::build(), FailurePolicy::Cancel);
        handle_start(&mut sched);

        let step = handle_task_completion(
            &mut sched,
            TaskKind::Scripts,
            TaskOutcome::Failed("syntax error".into()),
        );
        assert!(!step.keep_running);
        assert!(matches!(step.commands[0], CoreCommand::CancelTasks(ref t) if t.len() == 4));
        assert_eq!(
            step.commands.last(),
            Some(&CoreCommand::Finish(RunOutcome::Failed {
                failed: vec![TaskKind::Scripts]
            }))
        );
    }
}
