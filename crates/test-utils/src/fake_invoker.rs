use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::errors::PipelineError;
use assetpipe::exec::{TaskFuture, TaskInvoker};
use assetpipe::tasks::TaskReport;
use assetpipe::types::TaskKind;

/// A fake invoker that:
/// - records which tasks were invoked, in order
/// - fails the tasks it was told to fail
/// - optionally sleeps before finishing, so cancellation can be observed
#[derive(Debug, Clone, Default)]
pub struct FakeInvoker {
    invoked: Arc<Mutex<Vec<TaskKind>>>,
    finished: Arc<Mutex<Vec<TaskKind>>>,
    failing: HashSet<TaskKind>,
    delays: Vec<(TaskKind, Duration)>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, task: TaskKind) -> Self {
        self.failing.insert(task);
        self
    }

    pub fn delayed(mut self, task: TaskKind, delay: Duration) -> Self {
        self.delays.push((task, delay));
        self
    }

    /// Tasks in the order they were started.
    pub fn invoked(&self) -> Vec<TaskKind> {
        self.invoked.lock().unwrap().clone()
    }

    /// Tasks that ran to the end (not cancelled mid-flight).
    pub fn finished(&self) -> Vec<TaskKind> {
        self.finished.lock().unwrap().clone()
    }

    fn delay_for(&self, task: TaskKind) -> Option<Duration> {
        self.delays
            .iter()
            .find(|(t, _)| *t == task)
            .map(|(_, d)| *d)
    }
}

impl TaskInvoker for FakeInvoker {
    fn invoke(&self, task: TaskKind) -> TaskFuture<'_> {
        Box::pin(async move {
            self.invoked.lock().unwrap().push(task);

            if let Some(delay) = self.delay_for(task) {
                tokio::time::sleep(delay).await;
            }

            self.finished.lock().unwrap().push(task);
            if self.failing.contains(&task) {
                return Err(PipelineError::transform(task, "induced failure"));
            }
            Ok(TaskReport::default())
        })
    }
}
