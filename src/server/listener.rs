use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::info;

use crate::http::connection::Connection;
use crate::http::response::{Response, StatusCode};
use crate::server::dispatcher::{Admission, Dispatcher};
use crate::server::SessionHandler;

/// Accepts connections and feeds them to the dispatcher until `shutdown`
/// fires.
pub async fn run(
    listener: TcpListener,
    dispatcher: Dispatcher<SessionHandler>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    info!("Listening on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        // Usually fd exhaustion; back off instead of spinning.
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                };
                info!("Accepted connection from {}", peer);

                if let Admission::Refused(conn) = dispatcher.submit(Connection::new(socket, peer)) {
                    tokio::spawn(refuse(conn));
                }
            }

            _ = shutdown.recv() => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    Ok(())
}

async fn refuse(mut conn: Connection<TcpStream>) {
    let peer = conn.peer();
    let response = Response::error(
        StatusCode::ServiceUnavailable,
        "The server is shutting down. Please retry shortly.",
    );

    if let Err(e) = conn.reject(&response).await {
        tracing::debug!(peer = %peer, error = %e, "Failed to send 503");
    }
}
