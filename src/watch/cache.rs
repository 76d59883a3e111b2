// src/watch/cache.rs

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::trace;

use crate::fs::FileSystem;
use crate::watch::hash::compute_file_hash;

/// Per-file content hashes shared by every category of the monitor.
///
/// A change event evicts only the touched path, so re-gating a category
/// re-reads one file instead of the whole glob set.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<String> {
        match self.hashes.entry(path.to_path_buf()) {
            Entry::Occupied(hit) => Ok(hit.get().clone()),
            Entry::Vacant(slot) => {
                trace!(path = %path.display(), "hashing uncached file");
                Ok(slot.insert(compute_file_hash(fs, path)?).clone())
            }
        }
    }

    pub fn invalidate(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            trace!(path = %path.display(), "evicted cached hash");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn stale_until_invalidated() {
        let fs = MockFileSystem::new();
        let path = Path::new("/p/src/assets/js/main.js");
        fs.add_file(path, "one");

        let mut cache = FileCache::new();
        let first = cache.get_or_compute(&fs, path).unwrap();

        fs.add_file(path, "two");
        assert_eq!(cache.get_or_compute(&fs, path).unwrap(), first);

        cache.invalidate(path);
        assert_ne!(cache.get_or_compute(&fs, path).unwrap(), first);
    }
}
