//! Server configuration.
//!
//! Values come from three layers, lowest precedence first: built-in
//! defaults, an optional YAML file, and the positional command line
//! arguments `[port] [host] [max_threads]`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming a YAML config file, read by the CLI.
pub const CONFIG_ENV: &str = "FILE_SERVER_CONFIG";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_threads must be at least 1")]
    NoWorkers,
    #[error("read_timeout_secs must be at least 1")]
    ZeroReadTimeout,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
}

/// Listener and worker pool settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on connections served concurrently.
    pub max_threads: usize,
    pub read_timeout_secs: u64,
    /// How long shutdown waits for in-flight connections.
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Sandbox root for GET requests.
    pub root: PathBuf,
    /// Writable directory for POST uploads, created on startup.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// Command line overrides, applied on top of the file/default layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub max_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_threads: 10,
            read_timeout_secs: 30,
            shutdown_grace_secs: 5,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources"),
            upload_dir: PathBuf::from("resources").join("uploads"),
            max_upload_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Builds the effective configuration: `path` (if any) replaces the
    /// defaults, then `overrides` are applied and the result validated.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };

        cfg.apply(overrides);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(max) = overrides.max_threads {
            self.server.max_threads = max;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_threads == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.server.read_timeout_secs == 0 {
            return Err(ConfigError::ZeroReadTimeout);
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.server.read_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_grace_secs)
    }
}
