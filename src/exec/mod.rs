// src/exec/mod.rs

//! Task execution layer.
//!
//! This module runs scheduled tasks concurrently on the Tokio runtime and
//! reports back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`invoker`] defines the [`TaskInvoker`] seam: what running a task means.
//! - [`executor_loop`] owns the background loop which manages active tasks.
//! - [`task_runner`] runs one task instance under a cancellation token.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` the runtime uses in production, and which tests
//!   can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod invoker;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use invoker::{TaskFuture, TaskInvoker};
