// src/dag/task_info.rs

//! Task metadata and per-run state.

use crate::types::TaskKind;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on dependencies.
    Pending,
    /// Dispatched to the executor.
    Running,
    /// Completed successfully.
    DoneSuccess,
    /// Failed, or blocked by a failed dependency.
    DoneFailed,
    /// Stopped or skipped because a sibling failed (or shutdown).
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::DoneSuccess | RunState::DoneFailed | RunState::Cancelled
        )
    }
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Cancelled,
}

impl From<RunState> for TaskRunState {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Pending => TaskRunState::Pending,
            RunState::Running => TaskRunState::Running,
            RunState::DoneSuccess => TaskRunState::DoneSuccess,
            RunState::DoneFailed => TaskRunState::DoneFailed,
            RunState::Cancelled => TaskRunState::Cancelled,
        }
    }
}

/// Static task information plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub task: TaskKind,
    /// Direct dependencies.
    pub deps: Vec<TaskKind>,
    pub run_state: RunState,
}

impl TaskInfo {
    pub fn new(task: TaskKind, deps: Vec<TaskKind>) -> Self {
        Self {
            task,
            deps,
            run_state: RunState::Pending,
        }
    }
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task: TaskKind,
    /// Identifier of the plan run this dispatch belongs to.
    pub run_id: u64,
}
