// src/tasks/mod.rs

//! The pipeline's tasks.
//!
//! - [`styles`], [`scripts`], [`images`] and [`copy`] are the transforms.
//! - [`package`] zips the output tree.
//! - [`BuiltinTasks`] maps each [`TaskKind`] to its implementation and is the
//!   production [`TaskInvoker`].

use std::sync::Arc;

use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::exec::{TaskFuture, TaskInvoker};
use crate::server::{self, DevSession};
use crate::types::{AssetCategory, TaskKind};
use crate::watch::monitor::Monitor;

pub mod context;
pub mod copy;
pub mod css_map;
pub mod images;
pub mod package;
pub mod purge;
pub mod scripts;
pub mod styles;

pub use context::{BuildContext, TaskReport};

/// Production task invoker.
#[derive(Debug, Clone)]
pub struct BuiltinTasks {
    ctx: Arc<BuildContext>,
    session: DevSession,
}

impl BuiltinTasks {
    pub fn new(ctx: Arc<BuildContext>, session: DevSession) -> Self {
        Self { ctx, session }
    }

    pub fn session(&self) -> &DevSession {
        &self.session
    }

    async fn run(&self, task: TaskKind) -> Result<TaskReport> {
        let ctx = Arc::clone(&self.ctx);
        match task {
            TaskKind::Styles => {
                let report = blocking(task, move || styles::run(&ctx)).await?;
                let paths = report
                    .outputs
                    .iter()
                    .map(|p| web_path(&self.ctx.display_path(p)))
                    .collect();
                self.session.stream_css(paths);
                Ok(report)
            }
            TaskKind::Scripts => blocking(task, move || scripts::run(&ctx)).await,
            TaskKind::Images => blocking(task, move || images::run(&ctx)).await,
            TaskKind::CopyAssets => copy::run(&ctx, AssetCategory::CopyAssets),
            TaskKind::CopyCss => copy::run(&ctx, AssetCategory::CopyCss),
            TaskKind::Compress => blocking(task, move || package::run(&ctx)).await,
            TaskKind::Serve => {
                server::start(&ctx, &self.session).await?;
                Ok(TaskReport::default())
            }
            TaskKind::Reload => {
                self.session.reload();
                Ok(TaskReport::default())
            }
            TaskKind::Monitor => {
                let invoker: Arc<dyn TaskInvoker> = Arc::new(self.clone());
                let monitor = Monitor::start(ctx, invoker).await?;
                info!("monitor running");
                monitor.wait().await?;
                Ok(TaskReport::default())
            }
        }
    }
}

impl TaskInvoker for BuiltinTasks {
    fn invoke(&self, task: TaskKind) -> TaskFuture<'_> {
        Box::pin(self.run(task))
    }
}

/// Run CPU-heavy work off the async threads.
async fn blocking<F>(task: TaskKind, f: F) -> Result<TaskReport>
where
    F: FnOnce() -> Result<TaskReport> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::transform(task, format!("worker panicked: {e}")))?
}

/// URL path of an output file: its path below the top-level output
/// directory (`dist/assets/css/style.css` -> `assets/css/style.css`).
fn web_path(display_path: &str) -> String {
    match display_path.split_once('/') {
        Some((_, rest)) => rest.to_string(),
        None => display_path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::web_path;

    #[test]
    fn web_path_drops_output_root() {
        assert_eq!(web_path("dist/assets/css/style.css"), "assets/css/style.css");
        assert_eq!(web_path("style.css"), "style.css");
    }
}
