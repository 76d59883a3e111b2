// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender,
//! so tests can plug in an executor that records dispatches and emits
//! completions directly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::exec::executor_loop::{ExecutorRequest, spawn_executor};
use crate::exec::invoker::TaskInvoker;
use crate::types::TaskKind;

type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    fn spawn_ready_tasks(&mut self, tasks: Vec<ScheduledTask>) -> BackendFuture<'_>;

    /// Request cooperative cancellation of running tasks. A cancelled task
    /// never reports a completion.
    fn cancel_tasks(&mut self, tasks: Vec<TaskKind>) -> BackendFuture<'_>;

    /// Cancel whatever is still active and wait for it to stop.
    fn shutdown(&mut self) -> BackendFuture<'_>;
}

/// Real executor backend used in production.
///
/// Wraps the background loop from [`spawn_executor`]; every call is
/// forwarded to it over an mpsc channel.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ExecutorRequest>,
}

impl RealExecutorBackend {
    /// Spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, invoker: Arc<dyn TaskInvoker>) -> Self {
        let tx = spawn_executor(runtime_tx, invoker);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(&mut self, tasks: Vec<ScheduledTask>) -> BackendFuture<'_> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();
        Box::pin(async move {
            for task in tasks {
                tx.send(ExecutorRequest::Run(task))
                    .await
                    .map_err(Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel_tasks(&mut self, tasks: Vec<TaskKind>) -> BackendFuture<'_> {
        let tx = self.tx.clone();
        Box::pin(async move {
            tx.send(ExecutorRequest::Cancel(tasks))
                .await
                .map_err(Error::from)?;
            Ok(())
        })
    }

    fn shutdown(&mut self) -> BackendFuture<'_> {
        let tx = self.tx.clone();
        Box::pin(async move {
            let (done_tx, done_rx) = oneshot::channel();
            if tx.send(ExecutorRequest::Shutdown(done_tx)).await.is_err() {
                // Loop already gone; nothing left to stop.
                return Ok(());
            }
            let _ = done_rx.await;
            Ok(())
        })
    }
}
