// src/watch/monitor.rs

//! The monitor service: file changes -> category task -> reload.
//!
//! Each watched category gets its own worker, so categories run
//! independently and concurrently. Within a category, events are debounced
//! and coalesced: whatever arrives while the task runs causes at most one
//! follow-up run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::errors::{PipelineError, Result};
use crate::exec::TaskInvoker;
use crate::tasks::BuildContext;
use crate::types::{AssetCategory, TaskKind};
use crate::watch::cache::FileCache;
use crate::watch::event_handler::{HashGate, binding_hash, route_change};
use crate::watch::patterns::{WatchBinding, bindings_from_config, watch_dirs};
use crate::watch::watcher::{WatchSignal, WatcherHandle, spawn_watcher};

/// Running monitor. Dropping it stops every worker.
#[derive(Debug)]
pub struct Monitor {
    signals: mpsc::UnboundedSender<WatchSignal>,
    dispatcher: JoinHandle<Result<()>>,
    shutdown: CancellationToken,
    _guard: DropGuard,
    _watcher: Option<WatcherHandle>,
}

impl Monitor {
    /// Start the monitor with a filesystem watcher on the glob bases of the
    /// watched categories.
    pub async fn start(ctx: Arc<BuildContext>, invoker: Arc<dyn TaskInvoker>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dirs = watch_dirs(&ctx.root, &bindings_from_config(&ctx.config));
        let watcher = spawn_watcher(&dirs, tx.clone())?;
        Self::start_with(ctx, invoker, tx, rx, Some(watcher)).await
    }

    /// Start the monitor without a filesystem watcher; changes are fed in
    /// through [`Monitor::notify_path`].
    pub async fn start_detached(
        ctx: Arc<BuildContext>,
        invoker: Arc<dyn TaskInvoker>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::start_with(ctx, invoker, tx, rx, None).await
    }

    async fn start_with(
        ctx: Arc<BuildContext>,
        invoker: Arc<dyn TaskInvoker>,
        signals: mpsc::UnboundedSender<WatchSignal>,
        signal_rx: mpsc::UnboundedReceiver<WatchSignal>,
        watcher: Option<WatcherHandle>,
    ) -> Result<Self> {
        let shutdown = CancellationToken::new();
        let bindings = bindings_from_config(&ctx.config);
        let watch = ctx.config.watch();
        let debounce = Duration::from_millis(watch.debounce_ms);
        let cache = Arc::new(Mutex::new(FileCache::new()));

        let mut workers = HashMap::new();
        for binding in &bindings {
            let gate = if watch.use_hash {
                let initial = initial_hash(&ctx, binding, &cache).await;
                Some(HashGate::new(
                    Arc::clone(&ctx.fs),
                    ctx.root.clone(),
                    Arc::clone(&cache),
                    initial,
                ))
            } else {
                None
            };

            let (tx, rx) = mpsc::unbounded_channel();
            workers.insert(binding.category(), tx);
            tokio::spawn(category_worker(
                binding.clone(),
                Arc::clone(&invoker),
                rx,
                shutdown.clone(),
                debounce,
                gate,
            ));
        }

        let categories: Vec<_> = bindings.iter().map(|b| b.category().to_string()).collect();
        info!(?categories, debounce_ms = watch.debounce_ms, "monitor started");

        let dispatcher = tokio::spawn(dispatch_loop(
            ctx.root.clone(),
            bindings,
            workers,
            cache,
            signal_rx,
            shutdown.clone(),
        ));

        Ok(Self {
            signals,
            dispatcher,
            _guard: shutdown.clone().drop_guard(),
            shutdown,
            _watcher: watcher,
        })
    }

    /// Report a changed path, as the filesystem watcher would.
    pub fn notify_path(&self, path: impl Into<PathBuf>) {
        let _ = self.signals.send(WatchSignal::Changed(vec![path.into()]));
    }

    /// Run until stopped or until the watcher fails.
    pub async fn wait(mut self) -> Result<()> {
        let result = (&mut self.dispatcher).await;
        self.shutdown.cancel();
        result.map_err(|e| PipelineError::WatchError(format!("monitor dispatcher: {e}")))?
    }

    /// Stop every worker and wait for the dispatcher to exit.
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        self.wait().await
    }
}

async fn initial_hash(
    ctx: &Arc<BuildContext>,
    binding: &WatchBinding,
    cache: &Arc<Mutex<FileCache>>,
) -> Option<String> {
    let ctx = Arc::clone(ctx);
    let binding = binding.clone();
    let cache = Arc::clone(cache);
    tokio::task::spawn_blocking(move || {
        binding_hash(ctx.fs.as_ref(), &ctx.root, &binding, &cache).ok()
    })
    .await
    .ok()
    .flatten()
}

async fn dispatch_loop(
    root: PathBuf,
    bindings: Vec<WatchBinding>,
    workers: HashMap<AssetCategory, mpsc::UnboundedSender<()>>,
    cache: Arc<Mutex<FileCache>>,
    mut signals: mpsc::UnboundedReceiver<WatchSignal>,
    shutdown: CancellationToken,
) -> Result<()> {
    loop {
        let signal = tokio::select! {
            _ = shutdown.cancelled() => break,
            signal = signals.recv() => signal,
        };

        match signal {
            Some(WatchSignal::Changed(paths)) => {
                for path in paths {
                    dispatch_path(&root, &path, &bindings, &workers, &cache);
                }
            }
            Some(WatchSignal::Failed(message)) => {
                error!(error = %message, "file watcher failed; stopping monitor");
                shutdown.cancel();
                return Err(PipelineError::WatchError(message));
            }
            None => break,
        }
    }

    debug!("monitor dispatcher finished");
    Ok(())
}

fn dispatch_path(
    root: &Path,
    path: &Path,
    bindings: &[WatchBinding],
    workers: &HashMap<AssetCategory, mpsc::UnboundedSender<()>>,
    cache: &Mutex<FileCache>,
) {
    let Some(change) = route_change(root, path, bindings) else {
        return;
    };

    cache
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .invalidate(&change.cache_key);

    for category in change.categories {
        if let Some(worker) = workers.get(&category) {
            let _ = worker.send(());
        }
    }
}

async fn category_worker(
    binding: WatchBinding,
    invoker: Arc<dyn TaskInvoker>,
    mut rx: mpsc::UnboundedReceiver<()>,
    shutdown: CancellationToken,
    debounce: Duration,
    mut gate: Option<HashGate>,
) {
    let task = binding.task();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            msg = rx.recv() => if msg.is_none() { break },
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(debounce) => {}
        }
        // Everything that arrived during the debounce window is one change.
        while rx.try_recv().is_ok() {}

        if let Some(gate) = gate.as_mut() {
            if !gate.changed(&binding).await {
                continue;
            }
        }

        let finished = tokio::select! {
            _ = shutdown.cancelled() => break,
            finished = run_then_reload(invoker.as_ref(), task) => finished,
        };
        if !finished {
            debug!(task = %task, "reload skipped after failure");
        }
    }

    debug!(category = %binding.category(), "monitor worker finished");
}

/// Run the category task, then reload on success. Returns whether the
/// reload happened.
async fn run_then_reload(invoker: &dyn TaskInvoker, task: TaskKind) -> bool {
    info!(task = %task, "change detected; running task");
    match invoker.invoke(task).await {
        Ok(report) => {
            debug!(task = %task, files = report.files_written, "task finished");
        }
        Err(err) => {
            warn!(task = %task, error = %err, "task failed; monitor keeps running");
            return false;
        }
    }

    match invoker.invoke(TaskKind::Reload).await {
        Ok(_) => true,
        Err(err) => {
            warn!(error = %err, "reload failed");
            false
        }
    }
}
