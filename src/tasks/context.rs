// src/tasks/context.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::config::{ConfigFile, PathEntry};
use crate::errors::{PipelineError, Result};
use crate::fs::{FileSystem, SourceFile};
use crate::types::{AssetCategory, Mode};

/// Everything a task needs, fixed for the whole run.
///
/// Shared by `Arc`; never mutated once built.
#[derive(Debug)]
pub struct BuildContext {
    pub root: PathBuf,
    pub mode: Mode,
    pub config: ConfigFile,
    pub fs: Arc<dyn FileSystem>,
}

impl BuildContext {
    pub fn new(
        root: impl Into<PathBuf>,
        mode: Mode,
        config: ConfigFile,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            mode,
            config,
            fs,
        }
    }

    pub fn entry(&self, category: AssetCategory) -> &PathEntry {
        self.config.paths().get(category)
    }

    /// Resolve the files of a category. An empty match is logged, not fatal.
    pub fn sources(&self, category: AssetCategory) -> Result<Vec<SourceFile>> {
        let entry = self.entry(category);
        let files = entry
            .sources
            .resolve(self.fs.as_ref(), &self.root)
            .map_err(|e| PipelineError::transform(category.task(), format!("{e:#}")))?;

        if files.is_empty() {
            let err = PipelineError::SourceNotFound(entry.sources.patterns().join(", "));
            warn!(category = %category, "{err}");
        }
        Ok(files)
    }

    /// Destination directory of a category, under the project root.
    pub fn dest_dir(&self, category: AssetCategory) -> PathBuf {
        self.root.join(&self.entry(category).dest)
    }

    /// Where a source file lands: the destination plus its path relative to
    /// the glob base.
    pub fn output_path(&self, category: AssetCategory, file: &SourceFile) -> PathBuf {
        self.dest_dir(category).join(&file.relative)
    }

    /// `/`-separated path relative to the project root.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// What a task produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub files_written: usize,
    /// Written paths, in write order.
    pub outputs: Vec<PathBuf>,
}

impl TaskReport {
    pub fn record(&mut self, path: PathBuf) {
        self.files_written += 1;
        self.outputs.push(path);
    }
}
