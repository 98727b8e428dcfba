//! Host header validation against the names this server answers to.

use crate::http::error::ServeError;
use crate::http::request::Request;

#[derive(Debug, Clone)]
pub struct HostPolicy {
    allowed: Vec<String>,
}

impl HostPolicy {
    /// Accepts `host:port`, `localhost:port` and `127.0.0.1:port`. On port 80
    /// the bare names are accepted as well.
    pub fn new(host: &str, port: u16) -> Self {
        let names = [host, "localhost", "127.0.0.1"];
        let mut allowed: Vec<String> = names.iter().map(|h| format!("{h}:{port}")).collect();

        if port == 80 {
            allowed.extend(names.iter().map(|h| h.to_string()));
        }
        allowed.dedup();

        Self { allowed }
    }

    pub fn allows(&self, host: &str) -> bool {
        self.allowed.iter().any(|a| a == host)
    }

    pub fn check(&self, req: &Request) -> Result<(), ServeError> {
        match req.header("Host") {
            None => Err(ServeError::HostMissing),
            Some(host) if self.allows(host) => Ok(()),
            Some(host) => Err(ServeError::HostRejected(host.to_string())),
        }
    }
}
