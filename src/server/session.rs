// src/server/session.rs

//! Live handle to the running dev server.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Message pushed to connected browsers over the live-reload socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page refresh.
    Reload,
    /// Hot-swap the stylesheets with these URL paths.
    Css { paths: Vec<String> },
}

/// A running server: its address, its broadcast channel and its shutdown
/// token.
#[derive(Debug, Clone)]
pub struct ServerSession {
    addr: SocketAddr,
    tx: broadcast::Sender<ReloadMessage>,
    shutdown: CancellationToken,
}

impl ServerSession {
    pub fn new(
        addr: SocketAddr,
        tx: broadcast::Sender<ReloadMessage>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { addr, tx, shutdown }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Send a message to every connected client. Returns how many received it.
    pub fn broadcast(&self, message: ReloadMessage) -> usize {
        match self.tx.send(message) {
            Ok(n) => n,
            Err(_) => {
                debug!("no live-reload clients connected");
                0
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Shared slot holding the server session while one exists.
///
/// Cloned into every task invocation; tasks that notify browsers look up
/// the current session here and do nothing when it is empty.
#[derive(Debug, Clone, Default)]
pub struct DevSession {
    inner: Arc<RwLock<Option<ServerSession>>>,
}

impl DevSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, session: ServerSession) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(session);
    }

    /// The current session, if the server is running.
    pub fn current(&self) -> Option<ServerSession> {
        let slot = self.inner.read().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().filter(|s| !s.is_shut_down()).cloned()
    }

    /// Stop the server (if any) and empty the slot.
    pub fn close(&self) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = slot.take() {
            info!(addr = %session.addr(), "stopping dev server");
            session.shutdown();
        }
    }

    /// Ask every browser to refresh. Returns `false` without a session.
    pub fn reload(&self) -> bool {
        match self.current() {
            Some(session) => {
                let clients = session.broadcast(ReloadMessage::Reload);
                info!(clients, "live-reload: full refresh");
                true
            }
            None => {
                debug!("reload requested without a running server; nothing to do");
                false
            }
        }
    }

    /// Ask every browser to hot-swap the given stylesheets.
    pub fn stream_css(&self, paths: Vec<String>) -> bool {
        match self.current() {
            Some(session) => {
                let clients = session.broadcast(ReloadMessage::Css { paths });
                debug!(clients, "live-reload: css stream");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_serialize_with_type_tag() {
        let reload = serde_json::to_string(&ReloadMessage::Reload).unwrap();
        assert_eq!(reload, r#"{"type":"reload"}"#);

        let css = serde_json::to_string(&ReloadMessage::Css {
            paths: vec!["assets/css/style.css".into()],
        })
        .unwrap();
        assert_eq!(css, r#"{"type":"css","paths":["assets/css/style.css"]}"#);
    }

    #[tokio::test]
    async fn reload_without_session_is_a_noop() {
        let dev = DevSession::new();
        assert!(!dev.reload());
        assert!(!dev.stream_css(vec!["a.css".into()]));
    }

    #[tokio::test]
    async fn reload_reaches_subscribers() {
        let (tx, _) = broadcast::channel(8);
        let dev = DevSession::new();
        let session = ServerSession::new(
            "127.0.0.1:0".parse().unwrap(),
            tx,
            CancellationToken::new(),
        );
        let mut rx = session.subscribe();
        dev.set(session);

        assert!(dev.reload());
        assert_eq!(rx.recv().await.unwrap(), ReloadMessage::Reload);

        dev.close();
        assert!(dev.current().is_none());
    }
}
