// src/watch/hash.rs

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut reader = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Aggregate hash over `(path, file hash)` pairs.
///
/// `entries` must be sorted by path; paths take part so that adding or
/// removing a file changes the result.
pub fn compute_aggregate_hash(entries: &[(String, String)]) -> String {
    let mut hasher = Hasher::new();
    for (path, hash) in entries {
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
    }
    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, files = entries.len(), "computed aggregate hash");
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn file_hash_tracks_content() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.js", "one");
        let first = compute_file_hash(&fs, Path::new("/p/a.js")).unwrap();
        fs.add_file("/p/a.js", "two");
        let second = compute_file_hash(&fs, Path::new("/p/a.js")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn aggregate_depends_on_file_set() {
        let one = vec![("a.js".to_string(), "h".to_string())];
        let two = vec![
            ("a.js".to_string(), "h".to_string()),
            ("b.js".to_string(), "h".to_string()),
        ];
        assert_ne!(compute_aggregate_hash(&one), compute_aggregate_hash(&two));
    }
}
