// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces commands describing what
//! the IO shell should do next. It has no channels, no Tokio types, and
//! performs no IO, so it can be stepped by hand in tests.

use crate::dag::Scheduler;
use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{
    CoreStep, handle_shutdown, handle_start, handle_task_completion,
};

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Read access to the scheduler (for tests and dry-run output).
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Seed the run: dispatch every root task of the plan.
    pub fn start(&mut self) -> CoreStep {
        handle_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, task, outcome)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&mut self.scheduler),
        }
    }
}
