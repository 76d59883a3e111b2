// src/watch/path_utils.rs

//! Path helpers for the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First try a direct `strip_prefix(root)`.
/// - If that fails (symlinks, `/private/var` on macOS, ...), canonicalize
///   both paths and try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    // A deleted file cannot be canonicalized; fall back to its parent.
    let path_canon = path.canonicalize().ok().or_else(|| {
        let parent = path.parent()?.canonicalize().ok()?;
        Some(parent.join(path.file_name()?))
    })?;
    let root_canon = root.canonicalize().ok()?;

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        let rel = relative_str(Path::new("/proj"), Path::new("/proj/src/a.js"));
        assert_eq!(rel.as_deref(), Some("src/a.js"));
    }

    #[test]
    fn unrelated_path_is_none() {
        assert_eq!(
            relative_str(Path::new("/definitely/missing/a"), Path::new("/elsewhere/b")),
            None
        );
    }
}
