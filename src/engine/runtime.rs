// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::types::TaskKind;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RunOutcome, RuntimeEvent};

/// Drives the plan scheduler in response to `RuntimeEvent`s and delegates
/// task execution to an `ExecutorBackend`.
///
/// All run semantics live in `CoreRuntime`; this shell only reads events
/// from the channel and talks to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Seeds the run with the plan's root tasks.
    /// - Feeds every event into the core and executes the returned commands.
    /// - Returns once the core reports a final outcome.
    pub async fn run(mut self) -> Result<RunOutcome> {
        info!(run_id = self.core.scheduler().run_id(), "runtime started");

        let start = self.core.start();
        let mut outcome = self.execute_step(start).await?;

        while outcome.is_none() {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; treating as shutdown");
                    RuntimeEvent::ShutdownRequested
                }
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);
            outcome = self.execute_step(step).await?;
        }

        // Make sure nothing keeps running behind our back (e.g. the monitor).
        self.executor.shutdown().await?;

        let outcome = outcome.unwrap_or(RunOutcome::Interrupted);
        info!(?outcome, "runtime exiting");
        Ok(outcome)
    }

    /// Execute the commands of one core step. Returns the final outcome if
    /// the step ended the run.
    async fn execute_step(&mut self, step: CoreStep) -> Result<Option<RunOutcome>> {
        let mut finished = None;
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
                CoreCommand::CancelTasks(tasks) => self.cancel(tasks).await?,
                CoreCommand::Finish(outcome) => finished = Some(outcome),
            }
        }

        if finished.is_none() && !step.keep_running {
            finished = Some(RunOutcome::Interrupted);
        }
        Ok(finished)
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let names: Vec<_> = tasks.iter().map(|t| t.task.name()).collect();
        debug!(?names, "spawning ready tasks");
        self.executor.spawn_ready_tasks(tasks).await
    }

    async fn cancel(&mut self, tasks: Vec<TaskKind>) -> Result<()> {
        let names: Vec<_> = tasks.iter().map(|t| t.name()).collect();
        debug!(?names, "cancelling tasks");
        self.executor.cancel_tasks(tasks).await
    }
}
