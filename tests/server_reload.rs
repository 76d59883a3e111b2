// tests/server_reload.rs
//
// The dev server started through the production invoker, on an ephemeral
// port, with a real websocket client.

mod common;
use crate::common::{ConfigFileBuilder, Project, init_tracing, with_timeout};

use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;

use assetpipe::exec::TaskInvoker;
use assetpipe::server::DevSession;
use assetpipe::server::client::{CLIENT_PATH, CLIENT_TAG, WS_PATH};
use assetpipe::tasks::BuiltinTasks;
use assetpipe::types::{Mode, TaskKind};

const PAGE: &str = "<html><body><h1>hello</h1></body></html>";

async fn serve(project: &Project) -> (BuiltinTasks, SocketAddr) {
    let cfg = ConfigFileBuilder::new().with_port(0).build();
    let ctx = project.context(Mode::Development, cfg);
    let tasks = BuiltinTasks::new(ctx, DevSession::new());

    tasks.invoke(TaskKind::Serve).await.unwrap();
    let addr = tasks.session().current().expect("server session").addr();
    (tasks, addr)
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn html_pages_get_the_client_injected() {
    init_tracing();
    let project = Project::new();
    project
        .write("src/index.html", PAGE)
        .write("src/assets/js/main.js", "console.log(1);");
    let (tasks, addr) = serve(&project).await;

    let page = with_timeout(http_get(addr, "/")).await;
    assert!(page.starts_with("HTTP/1.1 200"));
    assert!(page.contains(&format!("{CLIENT_TAG}</body>")));

    let script = with_timeout(http_get(addr, "/assets/js/main.js")).await;
    assert!(script.contains("console.log(1);"));
    assert!(!script.contains(CLIENT_TAG));

    let client = with_timeout(http_get(addr, CLIENT_PATH)).await;
    assert!(client.contains(WS_PATH));

    let missing = with_timeout(http_get(addr, "/nope.html")).await;
    assert!(missing.starts_with("HTTP/1.1 404"));

    tasks.session().close();
}

#[tokio::test]
async fn reload_and_css_reach_connected_clients() {
    init_tracing();
    let project = Project::new();
    project.write("src/index.html", PAGE);
    let (tasks, addr) = serve(&project).await;

    let (mut socket, _) = with_timeout(connect_async(format!("ws://{addr}{WS_PATH}")))
        .await
        .unwrap();

    tasks.invoke(TaskKind::Reload).await.unwrap();
    let msg = with_timeout(socket.next()).await.unwrap().unwrap();
    assert_eq!(msg.to_text().unwrap(), r#"{"type":"reload"}"#);

    assert!(tasks.session().stream_css(vec!["assets/css/style.css".into()]));
    let msg = with_timeout(socket.next()).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(value["type"], "css");
    assert_eq!(value["paths"][0], "assets/css/style.css");

    tasks.session().close();
}

#[tokio::test]
async fn serving_twice_reuses_the_running_server() {
    init_tracing();
    let project = Project::new();
    project.write("src/index.html", PAGE);
    let (tasks, addr) = serve(&project).await;

    tasks.invoke(TaskKind::Serve).await.unwrap();
    assert_eq!(tasks.session().current().unwrap().addr(), addr);

    tasks.session().close();
    assert!(tasks.session().current().is_none());
}

#[tokio::test]
async fn reload_without_server_is_a_no_op() {
    init_tracing();
    let project = Project::new();
    let ctx = project.context(Mode::Development, ConfigFileBuilder::new().build());
    let tasks = Arc::new(BuiltinTasks::new(ctx, DevSession::new()));

    tasks.invoke(TaskKind::Reload).await.unwrap();
    assert!(!tasks.session().reload());
}

#[tokio::test]
async fn configured_base_dir_is_served() {
    init_tracing();
    let project = Project::new();
    project
        .write("src/index.html", PAGE)
        .write("public/index.html", "<html><body>public</body></html>");
    let cfg = ConfigFileBuilder::new()
        .with_port(0)
        .with_base_dir("public")
        .build();
    let ctx = project.context(Mode::Development, cfg);
    let tasks = BuiltinTasks::new(ctx, DevSession::new());

    tasks.invoke(TaskKind::Serve).await.unwrap();
    let addr = tasks.session().current().unwrap().addr();

    let page = with_timeout(http_get(addr, "/")).await;
    assert!(page.contains("public"));
    assert!(!page.contains("hello"));

    tasks.session().close();
}

#[tokio::test]
async fn missing_serve_root_fails_the_serve_task() {
    init_tracing();
    let project = Project::new();
    let cfg = ConfigFileBuilder::new().with_port(0).build();
    let ctx = project.context(Mode::Development, cfg);
    let tasks = BuiltinTasks::new(ctx, DevSession::new());

    assert!(tasks.invoke(TaskKind::Serve).await.is_err());
}
