//! Server bootstrap: binds the listener, wires sessions into the dispatcher
//! and runs until shutdown.

pub mod dispatcher;
pub mod listener;
pub mod shutdown;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::config::Config;
use crate::files::{PathResolver, UploadStore};
use crate::http::connection::{Connection, SessionContext};
use crate::http::host::HostPolicy;

pub use dispatcher::{Admission, ConnectionHandler, Dispatcher};
pub use shutdown::Shutdown;

/// Runs one HTTP session per admitted connection.
pub struct SessionHandler {
    ctx: Arc<SessionContext>,
}

impl SessionHandler {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }
}

impl ConnectionHandler for SessionHandler {
    type Conn = Connection<TcpStream>;

    async fn handle(&self, mut conn: Self::Conn) {
        let peer = conn.peer();
        if let Err(e) = conn.run(&self.ctx).await {
            tracing::error!("Connection error from {}: {}", peer, e);
        }
    }
}

pub struct Server {
    config: Config,
    listener: TcpListener,
    local_addr: SocketAddr,
    dispatcher: Dispatcher<SessionHandler>,
}

impl Server {
    /// Prepares the upload directory and sandbox root, then binds.
    ///
    /// Allowed Host values are derived from the bound port, so binding port 0
    /// works.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        let uploads = UploadStore::open(&config.files.upload_dir, config.files.max_upload_bytes)
            .await
            .with_context(|| {
                format!("failed to create upload directory {}", config.files.upload_dir.display())
            })?;
        let resolver = PathResolver::new(&config.files.root)
            .with_context(|| format!("invalid sandbox root {}", config.files.root.display()))?;

        let listener = TcpListener::bind(config.listen_addr())
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
        let local_addr = listener.local_addr()?;

        let ctx = SessionContext {
            resolver,
            uploads,
            hosts: HostPolicy::new(&config.server.host, local_addr.port()),
            read_timeout: config.read_timeout(),
        };
        let dispatcher = Dispatcher::new(SessionHandler::new(ctx), config.server.max_threads);

        tracing::info!(
            address = %local_addr,
            max_threads = config.server.max_threads,
            root = %config.files.root.display(),
            uploads = %config.files.upload_dir.display(),
            "Server bound"
        );

        Ok(Self {
            config,
            listener,
            local_addr,
            dispatcher,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn dispatcher(&self) -> &Dispatcher<SessionHandler> {
        &self.dispatcher
    }

    /// Serves until `shutdown` fires, then drains in-flight sessions.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        listener::run(self.listener, self.dispatcher.clone(), shutdown).await?;

        let drained = self.dispatcher.shutdown(self.config.shutdown_grace()).await;
        tracing::info!(drained, "Server stopped");
        Ok(())
    }
}
