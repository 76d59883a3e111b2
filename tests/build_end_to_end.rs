// tests/build_end_to_end.rs
//
// Whole entry points through the public `run`, against a real project.

mod common;
use crate::common::{Project, init_tracing, with_timeout};

use clap::Parser;

use assetpipe::cli::CliArgs;
use assetpipe::errors::PipelineError;
use assetpipe::run;
use assetpipe::types::TaskKind;

fn args(project: &Project, extra: &[&str]) -> CliArgs {
    let root = project.root().to_string_lossy().to_string();
    let mut argv = vec!["assetpipe"];
    argv.extend_from_slice(extra);
    argv.extend_from_slice(&["--root", &root]);
    CliArgs::try_parse_from(argv).unwrap()
}

fn site() -> Project {
    let project = Project::new();
    project
        .write("package.json", r#"{ "name": "demo-site" }"#)
        .write("src/index.html", "<html><body><p class=\"lead\">hi</p></body></html>")
        .write("src/assets/css/style.css", ".lead { color: red; }\n.gone { color: blue; }\n")
        .write("src/assets/css/print.css", "body { color: black; }\n")
        .write("src/assets/js/main.js", "const x = window.y ?? 2;\nconsole.log(x);\n")
        .write("src/assets/images/logo.svg", "<svg>\n  <!-- logo -->\n</svg>\n");
    project
}

#[tokio::test]
async fn build_writes_every_category() {
    init_tracing();
    let project = site();

    with_timeout(run(args(&project, &["build"]))).await.unwrap();

    assert!(project.exists("dist/index.html"));
    assert!(project.exists("dist/assets/css/print.css"));
    assert!(project.exists("dist/assets/js/main.js"));
    assert!(project.exists("dist/assets/images/logo.svg"));
    let css = project.read("dist/assets/css/style.css");
    assert!(css.contains(".lead"));
    assert!(!css.contains(".gone"));
    assert!(css.contains("sourceMappingURL"));
}

#[tokio::test]
async fn production_bundle_produces_an_archive() {
    init_tracing();
    let project = site();

    with_timeout(run(args(&project, &["bundle", "--prod"]))).await.unwrap();

    assert!(!project.read("dist/assets/css/style.css").contains("sourceMappingURL"));
    assert!(!project.read("dist/assets/js/main.js").contains("sourceMappingURL"));
    assert!(project.exists("finalproject/demo-site.zip"));
}

#[tokio::test]
async fn broken_stylesheet_fails_the_build() {
    init_tracing();
    let project = site();
    project.write("src/assets/css/style.css", "@import \"nowhere.css\";\n");

    let err = with_timeout(run(args(&project, &["bundle"]))).await.unwrap_err();

    match err {
        PipelineError::TasksFailed(failed) => {
            assert!(failed.contains(&TaskKind::Styles));
            assert!(failed.contains(&TaskKind::Compress));
        }
        other => panic!("expected TasksFailed, got {other:?}"),
    }
    assert!(!project.exists("finalproject/demo-site.zip"));
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    init_tracing();
    let project = site();

    run(args(&project, &["bundle", "--dry-run"])).await.unwrap();

    assert!(!project.exists("dist"));
}

#[tokio::test]
async fn invalid_config_file_is_reported() {
    init_tracing();
    let project = site();
    project.write("Assetpipe.toml", "[images]\npng_preset = 9\n");

    let err = run(args(&project, &["build"])).await.unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)));
}
