// src/server/routes.rs

//! HTTP surface of the dev server.

use std::path::{Component, Path, PathBuf};

use axum::Router;
use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::server::client::{CLIENT_PATH, CLIENT_SCRIPT, WS_PATH, inject_client};
use crate::server::session::ReloadMessage;

#[derive(Clone)]
struct ServerState {
    root: PathBuf,
    tx: broadcast::Sender<ReloadMessage>,
}

/// Build the router: live-reload endpoints plus static files from `root`.
pub fn router(root: PathBuf, tx: broadcast::Sender<ReloadMessage>) -> Router {
    Router::new()
        .route(WS_PATH, get(ws_handler))
        .route(CLIENT_PATH, get(client_script))
        .fallback(static_handler)
        .with_state(ServerState { root, tx })
}

async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_SCRIPT,
    )
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    // Subscribe before the handshake completes so no message sent after the
    // client sees the upgrade is lost.
    let rx = state.tx.subscribe();
    ws.on_upgrade(move |socket| client_loop(socket, rx))
}

async fn client_loop(socket: WebSocket, mut rx: broadcast::Receiver<ReloadMessage>) {
    let (mut sender, mut receiver) = socket.split();
    debug!("live-reload client connected");

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    let Ok(text) = serde_json::to_string(&msg) else {
                        continue;
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live-reload client lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("live-reload client disconnected");
}

async fn static_handler(State(state): State<ServerState>, req: Request) -> Response {
    if let Some(file) = html_file_for(&state.root, req.uri().path()) {
        match tokio::fs::read_to_string(&file).await {
            Ok(html) => return Html(inject_client(&html)).into_response(),
            Err(err) => debug!(path = ?file, error = %err, "falling back to static serving"),
        }
    }

    match ServeDir::new(&state.root).oneshot(req).await {
        Ok(res) => res.map(Body::new),
        Err(never) => match never {},
    }
}

/// Map a request path to an HTML file under `root`, if it names one.
fn html_file_for(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let rel = Path::new(uri_path.trim_start_matches('/'));
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }

    let mut candidate = root.join(rel);
    if uri_path.ends_with('/') || candidate.is_dir() {
        candidate = candidate.join("index.html");
    }

    let is_html = candidate
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));

    (is_html && candidate.is_file()).then_some(candidate)
}

