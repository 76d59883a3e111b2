// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod server;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::dag::{Plan, Scheduler};
use crate::engine::{CoreRuntime, RunOutcome, Runtime, RuntimeEvent};
use crate::errors::{PipelineError, Result};
use crate::exec::{RealExecutorBackend, TaskInvoker};
use crate::fs::RealFileSystem;
use crate::server::DevSession;
use crate::tasks::{BuildContext, BuiltinTasks};
use crate::types::{FailurePolicy, Mode};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file or built-in defaults)
/// - the plan for the requested entry point
/// - scheduler / runtime / executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    // Watch events carry absolute paths; every path derived from the root
    // must be in the same form.
    let root = std::path::absolute(&args.root)?;
    let config_path = root.join(&args.config);
    let mut cfg = load_or_default(&config_path)?;
    if let Some(port) = args.port {
        cfg.set_port(port);
    }

    let mode = Mode::from_prod_flag(args.prod);
    let plan = Plan::for_entry_point(&args.task)?;

    if args.dry_run {
        print_dry_run(&root, mode, &cfg, &plan);
        return Ok(());
    }

    info!(plan = plan.name(), %mode, root = %root.display(), "starting");
    if plan.nodes().iter().any(|n| n.task.is_long_lived()) {
        info!("plan includes a long-running task; press Ctrl+C to stop");
    }

    let policy = cfg.run().on_failure;
    let ctx = Arc::new(BuildContext::new(root, mode, cfg, Arc::new(RealFileSystem)));
    let session = DevSession::new();
    let invoker: Arc<dyn TaskInvoker> = Arc::new(BuiltinTasks::new(ctx, session.clone()));

    // Ctrl-C -> graceful shutdown.
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; shutting down");
            shutdown.cancel();
        });
    }

    let outcome = execute_plan(&plan, policy, invoker, shutdown).await;
    session.close();
    outcome_to_result(outcome?)
}

/// Run a plan to completion with the given invoker.
///
/// Cancelling `shutdown` interrupts the run: running tasks are cancelled
/// and the outcome is [`RunOutcome::Interrupted`].
pub async fn execute_plan(
    plan: &Plan,
    policy: FailurePolicy,
    invoker: Arc<dyn TaskInvoker>,
    shutdown: CancellationToken,
) -> Result<RunOutcome> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(rt_tx.clone(), invoker);
    let core = CoreRuntime::new(Scheduler::from_plan(plan, policy));

    let finished = CancellationToken::new();
    {
        let finished = finished.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let _ = rt_tx.send(RuntimeEvent::ShutdownRequested).await;
                }
                _ = finished.cancelled() => {}
            }
        });
    }

    let outcome = Runtime::new(core, rt_rx, executor).run().await;
    finished.cancel();
    outcome
}

/// Map a run outcome to the process result: failures are errors, an
/// interrupt of a long-running plan is not.
pub fn outcome_to_result(outcome: RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Succeeded => {
            info!("all tasks succeeded");
            Ok(())
        }
        RunOutcome::Interrupted => {
            info!("interrupted");
            Ok(())
        }
        RunOutcome::Failed { failed } => Err(PipelineError::TasksFailed(failed)),
    }
}

/// Dry-run output: the resolved path table and the plan.
fn print_dry_run(root: &Path, mode: Mode, cfg: &ConfigFile, plan: &Plan) {
    println!("assetpipe dry-run");
    println!("  root = {}", root.display());
    println!("  mode = {mode}");
    println!("  on_failure = {:?}", cfg.run().on_failure);
    println!();

    println!("paths:");
    for entry in cfg.paths().iter() {
        println!("  - {}", entry.category);
        println!("      src: {:?}", entry.sources.patterns());
        println!("      dest: {}", entry.dest.display());
    }
    println!();

    println!("plan '{}' ({} tasks):", plan.name(), plan.nodes().len());
    for node in plan.nodes() {
        if node.after.is_empty() {
            println!("  - {}", node.task);
        } else {
            let after: Vec<_> = node.after.iter().map(|t| t.name()).collect();
            println!("  - {} (after: {})", node.task, after.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
}
