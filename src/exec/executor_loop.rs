// src/exec/executor_loop.rs

//! Main executor loop that manages running tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::invoker::TaskInvoker;
use crate::exec::task_runner::run_task;
use crate::types::TaskKind;

/// Requests the runtime sends to the executor loop.
#[derive(Debug)]
pub enum ExecutorRequest {
    Run(ScheduledTask),
    Cancel(Vec<TaskKind>),
    /// Cancel everything, wait for it to stop, then acknowledge.
    Shutdown(oneshot::Sender<()>),
}

/// Internal handle for a currently-running task.
///
/// - `cancel` is used by the executor to request that the task stop.
/// - `handle` is the Tokio task that is actually running it.
struct ActiveTask {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawn the background executor loop.
///
/// Each scheduled task runs in its own Tokio task, and **per task kind there
/// is never more than one instance running at the same time**: scheduling a
/// task that is still running cancels the previous instance first.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    invoker: Arc<dyn TaskInvoker>,
) -> mpsc::Sender<ExecutorRequest> {
    let (tx, mut rx) = mpsc::channel::<ExecutorRequest>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<TaskKind, ActiveTask> = HashMap::new();

        while let Some(request) = rx.recv().await {
            match request {
                ExecutorRequest::Run(task) => {
                    handle_scheduled_task(task, &mut active, &runtime_tx, &invoker);
                }
                ExecutorRequest::Cancel(tasks) => {
                    for task in tasks {
                        cancel_task(task, &mut active);
                    }
                }
                ExecutorRequest::Shutdown(done) => {
                    stop_all(&mut active).await;
                    let _ = done.send(());
                    break;
                }
            }
        }

        info!("executor loop finished");
    });

    tx
}

fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<TaskKind, ActiveTask>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    invoker: &Arc<dyn TaskInvoker>,
) {
    if let Some(existing) = active.remove(&task.task) {
        if !existing.handle.is_finished() {
            info!(
                task = %task.task,
                run_id = task.run_id,
                "task rescheduled while running; cancelling previous instance"
            );
            existing.cancel.cancel();
        }
    }

    let cancel = CancellationToken::new();
    let kind = task.task;
    let handle = tokio::spawn(run_task(
        task,
        Arc::clone(invoker),
        runtime_tx.clone(),
        cancel.clone(),
    ));

    active.insert(kind, ActiveTask { cancel, handle });
}

fn cancel_task(task: TaskKind, active: &mut HashMap<TaskKind, ActiveTask>) {
    match active.remove(&task) {
        Some(existing) if !existing.handle.is_finished() => {
            info!(task = %task, "cancelling running task");
            existing.cancel.cancel();
        }
        Some(_) => {
            debug!(task = %task, "cancel requested but task already finished");
        }
        None => {
            debug!(task = %task, "cancel requested for task that is not active");
        }
    }
}

async fn stop_all(active: &mut HashMap<TaskKind, ActiveTask>) {
    for (task, entry) in active.drain() {
        if !entry.handle.is_finished() {
            debug!(task = %task, "stopping task on shutdown");
            entry.cancel.cancel();
        }
        let _ = entry.handle.await;
    }
}
