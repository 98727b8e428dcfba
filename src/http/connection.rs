use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::files::{PathResolver, UploadStore, serve_file};
use crate::http::error::ServeError;
use crate::http::host::HostPolicy;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Method, Request};
use crate::http::response::{KeepAlive, Response, StatusCode};
use crate::http::writer::ResponseWriter;

/// Requests served on one connection before it is closed.
pub const MAX_REQUESTS: usize = 100;

/// Bytes taken from the socket per request.
pub const READ_BUFFER_SIZE: usize = 8192;

/// Everything a session needs besides its socket. Shared by all sessions.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub resolver: PathResolver,
    pub uploads: UploadStore,
    pub hosts: HostPolicy,
    pub read_timeout: Duration,
}

pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    created_at: Instant,
    request_count: usize,
    keep_alive: bool,
    buffer: BytesMut,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Parsed(Request),
    Routed { response: Response, keep_alive: bool },
    Closed,
}

enum ReadEvent {
    Data,
    PeerClosed,
    TimedOut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            created_at: Instant::now(),
            request_count: 0,
            keep_alive: false,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            state: ConnectionState::Reading,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn request_count(&self) -> usize {
        self.request_count
    }

    /// Keep-alive decision for the most recent request.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Drives the request/response loop until the connection closes.
    ///
    /// The socket is shut down on every path that leaves the loop normally;
    /// on a write error it is dropped with the connection.
    pub async fn run(&mut self, ctx: &SessionContext) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => match self.read_request(ctx.read_timeout).await {
                    Ok(ReadEvent::Data) => self.parse(),
                    Ok(ReadEvent::PeerClosed) => {
                        tracing::debug!(peer = %self.peer, "Peer closed connection");
                        ConnectionState::Closed
                    }
                    Ok(ReadEvent::TimedOut) => {
                        tracing::info!(
                            peer = %self.peer,
                            timeout_secs = ctx.read_timeout.as_secs(),
                            "Read timed out, closing connection"
                        );
                        ConnectionState::Closed
                    }
                    Err(e) => {
                        tracing::warn!(peer = %self.peer, error = %e, "Read failed");
                        ConnectionState::Closed
                    }
                },

                ConnectionState::Parsed(req) => {
                    let (response, keep_alive) = self.handle_request(&req, ctx).await;
                    ConnectionState::Routed { response, keep_alive }
                }

                ConnectionState::Routed { response, keep_alive } => {
                    let mut writer = ResponseWriter::new(&response);
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive && self.request_count < MAX_REQUESTS {
                        ConnectionState::Reading
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        let _ = self.stream.shutdown().await;
        tracing::debug!(
            peer = %self.peer,
            requests = self.request_count,
            lifetime_ms = self.created_at.elapsed().as_millis() as u64,
            "Connection closed"
        );
        Ok(())
    }

    /// Sends one response without reading a request, then closes.
    pub async fn reject(&mut self, response: &Response) -> anyhow::Result<()> {
        ResponseWriter::new(response)
            .write_to_stream(&mut self.stream)
            .await?;
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn read_request(&mut self, limit: Duration) -> std::io::Result<ReadEvent> {
        self.buffer.clear();
        self.buffer.resize(READ_BUFFER_SIZE, 0);

        let n = match tokio::time::timeout(limit, self.stream.read(&mut self.buffer[..])).await {
            Ok(read) => read?,
            Err(_) => return Ok(ReadEvent::TimedOut),
        };
        self.buffer.truncate(n);

        if n == 0 {
            return Ok(ReadEvent::PeerClosed);
        }
        Ok(ReadEvent::Data)
    }

    fn parse(&self) -> ConnectionState {
        match parse_http_request(&self.buffer) {
            Ok(req) => ConnectionState::Parsed(req),
            Err(ParseError::Empty) => ConnectionState::Closed,
            Err(ParseError::InvalidEncoding) => {
                tracing::warn!(peer = %self.peer, "Undecodable request head, closing connection");
                ConnectionState::Closed
            }
            Err(e) => {
                tracing::warn!(peer = %self.peer, error = %e, "Malformed request");
                let err = ServeError::MalformedRequest(e.to_string());
                ConnectionState::Routed {
                    response: err.to_response(),
                    keep_alive: false,
                }
            }
        }
    }

    async fn handle_request(&mut self, req: &Request, ctx: &SessionContext) -> (Response, bool) {
        self.request_count += 1;

        // Decided before routing so the response can announce it.
        self.keep_alive = req.keep_alive() && self.request_count < MAX_REQUESTS;
        let advertised = self.keep_alive.then(|| KeepAlive {
            timeout_secs: ctx.read_timeout.as_secs(),
            max: MAX_REQUESTS,
        });

        let result = match ctx.hosts.check(req) {
            Err(e) => Err(e),
            Ok(()) => match &req.method {
                Method::GET => serve_file(&ctx.resolver, req, advertised).await,
                Method::POST => ctx.uploads.store(req, advertised).await,
                Method::Other(m) => Err(ServeError::MethodUnsupported(m.clone())),
            },
        };

        match result {
            Ok(response) => {
                tracing::info!(
                    peer = %self.peer,
                    method = %req.method,
                    path = %req.path,
                    status = response.status.as_u16(),
                    keep_alive = self.keep_alive,
                    request = self.request_count,
                    "Request handled"
                );
                let keep_alive = self.keep_alive;
                (response, keep_alive)
            }
            Err(e) => {
                let status = e.status();
                if status == StatusCode::InternalServerError {
                    tracing::error!(
                        peer = %self.peer,
                        method = %req.method,
                        path = %req.path,
                        error = %e,
                        "Request failed"
                    );
                } else {
                    tracing::warn!(
                        peer = %self.peer,
                        method = %req.method,
                        path = %req.path,
                        status = status.as_u16(),
                        error = %e,
                        "Request rejected"
                    );
                }
                self.keep_alive = false;
                (e.to_response(), false)
            }
        }
    }
}
