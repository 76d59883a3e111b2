// src/exec/invoker.rs

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::tasks::TaskReport;
use crate::types::TaskKind;

/// Boxed future returned by [`TaskInvoker::invoke`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<TaskReport>> + Send + 'a>>;

/// Runs a single task to completion.
///
/// Production code uses `tasks::BuiltinTasks`; tests substitute a fake that
/// records invocations and fails chosen tasks.
pub trait TaskInvoker: Send + Sync {
    fn invoke(&self, task: TaskKind) -> TaskFuture<'_>;
}
