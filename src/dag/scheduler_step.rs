// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::types::TaskKind;

/// Structured result of a single scheduler "step".
///
/// Tests use this to step the DAG by hand and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked as failed in this step (the failing task plus any
    /// dependents that can no longer run).
    pub newly_failed: Vec<TaskKind>,
    /// Running tasks the executor must stop.
    pub to_cancel: Vec<TaskKind>,
    /// Whether this step caused the run to finish.
    pub run_just_finished: bool,
}
