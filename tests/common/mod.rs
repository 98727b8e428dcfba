//! Shared fixtures: a scratch sandbox on disk and a minimal response reader.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fileserver::files::{PathResolver, UploadStore};
use fileserver::http::connection::SessionContext;
use fileserver::http::host::HostPolicy;
use fileserver::http::parser::parse_header_line;
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

pub const INDEX_HTML: &str = "<!DOCTYPE html><html><body><h1>It works</h1></body></html>\n";

/// A throwaway sandbox root under the system temp dir.
pub struct Site {
    pub root: PathBuf,
}

impl Site {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("fileserver-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("index.html"), INDEX_HTML).unwrap();
        Self { root }
    }

    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn uploads(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn uploaded_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.uploads()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn context(&self, port: u16, max_upload_bytes: usize) -> SessionContext {
        SessionContext {
            resolver: PathResolver::new(&self.root).unwrap(),
            uploads: UploadStore::open(self.uploads(), max_upload_bytes).await.unwrap(),
            hosts: HostPolicy::new("127.0.0.1", port),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:50000".parse().unwrap()
}

pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root.canonicalize().unwrap())
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    /// Header names lower-cased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Reads one Content-Length delimited response. `None` if the stream ends
/// before any byte arrives.
pub async fn read_response<R: AsyncRead + Unpin>(stream: &mut R) -> Option<RawResponse> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            assert!(buf.is_empty(), "stream closed mid-response");
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(buf[..head_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let mut status_line = lines.next().unwrap().splitn(3, ' ');
    assert_eq!(status_line.next(), Some("HTTP/1.1"));
    let status: u16 = status_line.next().unwrap().parse().unwrap();
    let reason = status_line.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines.filter_map(parse_header_line).collect();
    let length: usize = headers
        .get("content-length")
        .map(|v| v.parse().unwrap())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "stream closed mid-body");
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(length);

    Some(RawResponse {
        status,
        reason,
        headers,
        body,
    })
}

pub fn get(path: &str, host: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: {host}\r\n\r\n")
}
