// src/watch/event_handler.rs

//! Turning filesystem changes into per-category work.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::types::AssetCategory;
use crate::watch::cache::FileCache;
use crate::watch::hash::compute_aggregate_hash;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBinding;

/// A change event resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedChange {
    /// `root.join(rel)`, the same form as `SourceFile::path`, which keys
    /// the hash cache. Event paths are absolute even when the root is not.
    pub cache_key: PathBuf,
    pub categories: Vec<AssetCategory>,
}

/// Relate a changed path to the root and to the bindings it belongs to.
///
/// Returns `None` for paths outside the root or outside every binding.
pub fn route_change(root: &Path, path: &Path, bindings: &[WatchBinding]) -> Option<RoutedChange> {
    let Some(rel) = relative_str(root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, root);
        return None;
    };

    let categories: Vec<AssetCategory> = bindings
        .iter()
        .filter(|b| b.matches(&rel))
        .map(|b| b.category())
        .collect();
    if categories.is_empty() {
        return None;
    }

    debug!(path = %rel, matched = ?categories, "watch match");
    Some(RoutedChange {
        cache_key: root.join(&rel),
        categories,
    })
}

/// Aggregate content hash of every file a binding currently matches.
pub fn binding_hash(
    fs: &dyn FileSystem,
    root: &Path,
    binding: &WatchBinding,
    cache: &Mutex<FileCache>,
) -> anyhow::Result<String> {
    let files = binding.sources().resolve(fs, root)?;
    let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let hash = cache.get_or_compute(fs, &file.path)?;
        entries.push((file.rel_path, hash));
    }
    entries.sort();
    Ok(compute_aggregate_hash(&entries))
}

/// Skips runs whose watched content did not change since the last run.
#[derive(Debug)]
pub struct HashGate {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    cache: Arc<Mutex<FileCache>>,
    last: Option<String>,
}

impl HashGate {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        root: PathBuf,
        cache: Arc<Mutex<FileCache>>,
        last: Option<String>,
    ) -> Self {
        Self {
            fs,
            root,
            cache,
            last,
        }
    }

    /// `true` when the binding's content differs from the last accepted
    /// state (or cannot be hashed). Records the new state.
    pub async fn changed(&mut self, binding: &WatchBinding) -> bool {
        let fs = Arc::clone(&self.fs);
        let root = self.root.clone();
        let cache = Arc::clone(&self.cache);
        let owned = binding.clone();

        let hashed = tokio::task::spawn_blocking(move || {
            binding_hash(fs.as_ref(), &root, &owned, &cache)
        })
        .await;

        let new_hash = match hashed {
            Ok(Ok(hash)) => hash,
            Ok(Err(err)) => {
                warn!(
                    category = %binding.category(),
                    error = %err,
                    "failed to hash watched files; running anyway"
                );
                return true;
            }
            // If the blocking task panics, default to running.
            Err(_) => return true,
        };

        if self.last.as_deref() == Some(new_hash.as_str()) {
            info!(
                category = %binding.category(),
                "watched content unchanged; skipping run"
            );
            return false;
        }
        self.last = Some(new_hash);
        true
    }
}
