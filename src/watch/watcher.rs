// src/watch/watcher.rs

use std::path::PathBuf;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::Result;

/// What the notify callback forwards into the async world.
#[derive(Debug)]
pub enum WatchSignal {
    /// Paths touched by one filesystem event.
    Changed(Vec<PathBuf>),
    /// The backend reported an error; the stream ends after this.
    Failed(String),
}

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping it stops
/// watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch each of `dirs` recursively and forward content changes to `tx`.
///
/// Directories that do not exist yet are skipped with a warning.
pub fn spawn_watcher(
    dirs: &[PathBuf],
    tx: mpsc::UnboundedSender<WatchSignal>,
) -> Result<WatcherHandle> {
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let signal = match res {
                Ok(event) if is_content_event(&event.kind) => WatchSignal::Changed(event.paths),
                Ok(_) => return,
                Err(err) => WatchSignal::Failed(err.to_string()),
            };
            // The receiver is gone once the monitor stops.
            let _ = tx.send(signal);
        },
        Config::default(),
    )?;

    let mut watched = 0;
    for dir in dirs {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "watch directory does not exist; not watching it");
            continue;
        }
        watcher.watch(dir, RecursiveMode::Recursive)?;
        watched += 1;
    }
    info!(dirs = ?dirs, watched, "file watcher started");

    Ok(WatcherHandle { _inner: watcher })
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}
