// src/server/mod.rs

//! Local dev server with live reload.
//!
//! - [`routes`] serves the source tree and the live-reload endpoints.
//! - [`session`] holds the handle to a running server and the messages
//!   pushed to browsers.
//! - [`client`] is the browser-side script and the HTML injection helper.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::{PipelineError, Result};
use crate::tasks::BuildContext;

pub mod client;
pub mod routes;
pub mod session;

pub use session::{DevSession, ReloadMessage, ServerSession};

/// Bind the configured address, start serving in the background and
/// register the session. Returns once the listener is bound.
///
/// Calling this while a server is already running reuses it.
pub async fn start(ctx: &BuildContext, dev: &DevSession) -> Result<SocketAddr> {
    if let Some(existing) = dev.current() {
        info!(addr = %existing.addr(), "dev server already running");
        return Ok(existing.addr());
    }

    let server = ctx.config.server();
    let root = ctx.config.server_root(&ctx.root);
    if !root.is_dir() {
        return Err(PipelineError::ServerError(format!(
            "serve root {} is not a directory",
            root.display()
        )));
    }

    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| {
            PipelineError::ServerError(format!(
                "binding {}:{}: {e}",
                server.host, server.port
            ))
        })?;
    let addr = listener.local_addr()?;

    let (tx, _) = broadcast::channel(64);
    let shutdown = CancellationToken::new();
    let app = routes::router(root.clone(), tx.clone());

    let token = shutdown.clone();
    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(token.cancelled_owned())
            .await;
        if let Err(err) = result {
            error!(error = %err, "dev server stopped with an error");
        }
    });

    info!(%addr, root = %root.display(), "dev server listening on http://{addr}");
    dev.set(ServerSession::new(addr, tx, shutdown));
    Ok(addr)
}
