// tests/monitor_behaviour.rs
//
// The monitor fed by explicit path notifications, with a fake invoker.

mod common;
use crate::common::{ConfigFileBuilder, FakeInvoker, Project, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use assetpipe::config::ConfigFile;
use assetpipe::exec::TaskInvoker;
use assetpipe::types::{Mode, TaskKind};
use assetpipe::watch::Monitor;

fn fast_config() -> ConfigFile {
    ConfigFileBuilder::new().with_debounce_ms(20).build()
}

fn project() -> Project {
    let project = Project::new();
    project
        .write("src/index.html", "<html></html>")
        .write("src/assets/js/main.js", "console.log(1);\n")
        .write("src/assets/css/style.css", "body { margin: 0; }\n");
    project
}

async fn start(project: &Project, cfg: ConfigFile, fake: &FakeInvoker) -> Monitor {
    let ctx = project.context(Mode::Development, cfg);
    let invoker: Arc<dyn TaskInvoker> = Arc::new(fake.clone());
    Monitor::start_detached(ctx, invoker).await.unwrap()
}

async fn wait_for_invocations(fake: &FakeInvoker, count: usize) {
    with_timeout(async {
        while fake.invoked().len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn script_change_runs_scripts_then_reload() {
    init_tracing();
    let project = project();
    let fake = FakeInvoker::new();
    let monitor = start(&project, fast_config(), &fake).await;

    project.write("src/assets/js/main.js", "console.log(2);\n");
    monitor.notify_path(project.path("src/assets/js/main.js"));

    wait_for_invocations(&fake, 2).await;
    // Give a spurious extra run the chance to show up.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fake.invoked(), vec![TaskKind::Scripts, TaskKind::Reload]);

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn burst_of_changes_is_coalesced() {
    init_tracing();
    let project = project();
    let fake = FakeInvoker::new();
    let cfg = ConfigFileBuilder::new().with_debounce_ms(100).build();
    let monitor = start(&project, cfg, &fake).await;

    for i in 0..5 {
        project.write("src/assets/js/main.js", format!("console.log({i});\n"));
        monitor.notify_path(project.path("src/assets/js/main.js"));
    }

    wait_for_invocations(&fake, 2).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(fake.invoked(), vec![TaskKind::Scripts, TaskKind::Reload]);

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn unchanged_content_is_skipped() {
    init_tracing();
    let project = project();
    let fake = FakeInvoker::new();
    let monitor = start(&project, fast_config(), &fake).await;

    // Same bytes as at startup.
    project.write("src/assets/js/main.js", "console.log(1);\n");
    monitor.notify_path(project.path("src/assets/js/main.js"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(fake.invoked().is_empty());

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn without_hashing_every_change_runs() {
    init_tracing();
    let project = project();
    let fake = FakeInvoker::new();
    let cfg = ConfigFileBuilder::new()
        .with_debounce_ms(20)
        .with_use_hash(false)
        .build();
    let monitor = start(&project, cfg, &fake).await;

    monitor.notify_path(project.path("src/assets/js/main.js"));

    wait_for_invocations(&fake, 2).await;
    assert_eq!(fake.invoked(), vec![TaskKind::Scripts, TaskKind::Reload]);

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn failed_task_skips_reload_and_keeps_watching() {
    init_tracing();
    let project = project();
    let fake = FakeInvoker::new().failing(TaskKind::Styles);
    let monitor = start(&project, fast_config(), &fake).await;

    project.write("src/assets/css/style.css", "body { margin: 1px; }\n");
    monitor.notify_path(project.path("src/assets/css/style.css"));
    wait_for_invocations(&fake, 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fake.invoked(), vec![TaskKind::Styles]);

    project.write("src/index.html", "<html><body></body></html>");
    monitor.notify_path(project.path("src/index.html"));
    wait_for_invocations(&fake, 3).await;
    assert_eq!(
        fake.invoked(),
        vec![TaskKind::Styles, TaskKind::CopyAssets, TaskKind::Reload]
    );

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn unrelated_paths_are_ignored() {
    init_tracing();
    let project = project();
    let fake = FakeInvoker::new();
    let monitor = start(&project, fast_config(), &fake).await;

    project.write("README.md", "# notes");
    monitor.notify_path(project.path("README.md"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(fake.invoked().is_empty());

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn real_watcher_sees_edits_under_a_relative_root() {
    init_tracing();
    // Integration tests run from the package root, so this directory can
    // be named relative to the working directory.
    let dir = tempfile::tempdir_in(".").unwrap();
    let rel_root = std::path::PathBuf::from(dir.path().file_name().unwrap());
    std::fs::create_dir_all(rel_root.join("src/assets/js")).unwrap();
    std::fs::write(rel_root.join("src/assets/js/main.js"), "console.log(1);\n").unwrap();

    let ctx = Arc::new(assetpipe::tasks::BuildContext::new(
        rel_root.clone(),
        Mode::Development,
        fast_config(),
        Arc::new(assetpipe::fs::RealFileSystem),
    ));
    let fake = FakeInvoker::new();
    let invoker: Arc<dyn TaskInvoker> = Arc::new(fake.clone());
    let monitor = Monitor::start(ctx, invoker).await.unwrap();

    std::fs::write(rel_root.join("src/assets/js/main.js"), "console.log(2);\n").unwrap();

    wait_for_invocations(&fake, 2).await;
    assert_eq!(&fake.invoked()[..2], &[TaskKind::Scripts, TaskKind::Reload]);

    monitor.stop().await.unwrap();
}

#[tokio::test]
async fn output_directories_are_not_watched() {
    init_tracing();
    let project = project();
    project.write("dist/assets/js/main.js", "old");
    let ctx = project.context(Mode::Development, fast_config());
    let fake = FakeInvoker::new();
    let invoker: Arc<dyn TaskInvoker> = Arc::new(fake.clone());
    let monitor = Monitor::start(ctx, invoker).await.unwrap();

    project.write("dist/assets/js/main.js", "new");
    project.write("README.md", "# notes");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(fake.invoked().is_empty());

    monitor.stop().await.unwrap();
}
