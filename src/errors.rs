// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::TaskKind;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("No source files matched: {0}")]
    SourceNotFound(String),

    #[error("Task '{task}' failed: {message}")]
    Transform { task: TaskKind, message: String },

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Tasks failed: {}", format_tasks(.0))]
    TasksFailed(Vec<TaskKind>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn transform(task: TaskKind, message: impl Into<String>) -> Self {
        PipelineError::Transform {
            task,
            message: message.into(),
        }
    }
}

impl From<notify::Error> for PipelineError {
    fn from(err: notify::Error) -> Self {
        PipelineError::WatchError(err.to_string())
    }
}

fn format_tasks(tasks: &[TaskKind]) -> String {
    tasks
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
