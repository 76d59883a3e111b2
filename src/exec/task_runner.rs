// src/exec/task_runner.rs

//! Individual task runner.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::exec::invoker::TaskInvoker;

/// Run a single task and emit a `TaskCompleted` event with its outcome.
///
/// If the cancellation token fires first, the task future is dropped and
/// **no** `TaskCompleted` event is sent for that instance.
pub async fn run_task(
    task: ScheduledTask,
    invoker: Arc<dyn TaskInvoker>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    cancel: CancellationToken,
) {
    let kind = task.task;
    let run_id = task.run_id;
    info!(task = %kind, run_id, "starting task");
    let started = Instant::now();

    tokio::select! {
        result = invoker.invoke(kind) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let outcome = match result {
                Ok(report) => {
                    info!(
                        task = %kind,
                        run_id,
                        files = report.files_written,
                        elapsed_ms,
                        "task finished"
                    );
                    TaskOutcome::Success
                }
                Err(err) => {
                    error!(task = %kind, run_id, error = %err, elapsed_ms, "task failed");
                    TaskOutcome::Failed(err.to_string())
                }
            };

            if runtime_tx
                .send(RuntimeEvent::TaskCompleted { task: kind, outcome })
                .await
                .is_err()
            {
                debug!(task = %kind, run_id, "runtime gone; dropping completion");
            }
        }

        _ = cancel.cancelled() => {
            info!(task = %kind, run_id, "task instance cancelled");
        }
    }
}
