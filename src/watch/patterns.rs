// src/watch/patterns.rs

//! Watch bindings: which category's globs re-run which task.

use std::path::{Path, PathBuf};

use crate::config::ConfigFile;
use crate::fs::SourceSet;
use crate::types::{AssetCategory, TaskKind};

/// Categories the monitor watches. Raw stylesheets are not re-copied on
/// change; the styles binding covers the entry stylesheet.
pub const WATCHED_CATEGORIES: [AssetCategory; 4] = [
    AssetCategory::CopyAssets,
    AssetCategory::Styles,
    AssetCategory::Scripts,
    AssetCategory::Images,
];

/// One `globs -> task -> reload` binding.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    category: AssetCategory,
    sources: SourceSet,
}

impl WatchBinding {
    pub fn new(category: AssetCategory, sources: SourceSet) -> Self {
        Self { category, sources }
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    pub fn task(&self) -> TaskKind {
        self.category.task()
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Whether a root-relative, `/`-separated path belongs to this binding.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.sources.matches(rel_path)
    }
}

/// Build the monitor's bindings from the path table.
pub fn bindings_from_config(cfg: &ConfigFile) -> Vec<WatchBinding> {
    WATCHED_CATEGORIES
        .iter()
        .map(|&category| WatchBinding::new(category, cfg.paths().get(category).sources.clone()))
        .collect()
}

/// Directories to watch: the glob bases of every binding, with bases
/// nested inside another one dropped. Output trees next to the sources
/// (`dist/`, `node_modules/`) stay unwatched.
pub fn watch_dirs(root: &Path, bindings: &[WatchBinding]) -> Vec<PathBuf> {
    let mut bases: Vec<&Path> = bindings.iter().flat_map(|b| b.sources.bases()).collect();
    bases.sort();
    bases.dedup();

    let mut dirs: Vec<&Path> = Vec::new();
    for base in bases {
        if !dirs.iter().any(|kept| base.starts_with(kept)) {
            dirs.push(base);
        }
    }
    dirs.into_iter().map(|base| root.join(base)).collect()
}
