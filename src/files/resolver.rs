//! Maps request paths onto files inside the sandbox root.

use std::io;
use std::path::{Path, PathBuf};

use crate::http::error::ServeError;
use crate::http::mime;

/// Why a path could not be served.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("traversal attempt in {0:?}")]
    Traversal(String),
    #[error("{0:?} resolves outside the sandbox root")]
    Escape(String),
    #[error("{0:?} not found")]
    NotFound(String),
    #[error("{0:?} has no servable content type")]
    UnsupportedType(String),
}

impl From<Rejection> for ServeError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::Traversal(p) | Rejection::Escape(p) => ServeError::PathRejected(p),
            Rejection::NotFound(p) => ServeError::ResourceMissing(p),
            Rejection::UnsupportedType(p) => ServeError::TypeUnsupported(p),
        }
    }
}

/// A file that passed every sandbox check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Canonical location on disk.
    pub path: PathBuf,
    pub content_type: &'static str,
}

impl ResolvedFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Canonicalizes `root` once; it must exist.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    /// Resolves a raw request target.
    ///
    /// The traversal check runs on the undecoded path, before anything
    /// touches the filesystem. Canonicalization then catches symlinks that
    /// point out of the root.
    pub fn resolve(&self, raw_path: &str) -> Result<ResolvedFile, Rejection> {
        let path = raw_path.split_once('?').map_or(raw_path, |(p, _)| p);

        if path.contains("..") || path.starts_with("//") {
            return Err(Rejection::Traversal(raw_path.to_string()));
        }

        let path = if path.is_empty() || path == "/" {
            "/index.html"
        } else {
            path
        };
        let relative = path.trim_start_matches('/');
        let candidate = self.root.join(relative);

        let content_type = mime::content_type_for(&candidate)
            .ok_or_else(|| Rejection::UnsupportedType(path.to_string()))?;

        let canonical = candidate.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Rejection::NotFound(path.to_string()),
            _ => Rejection::Escape(path.to_string()),
        })?;

        if !canonical.starts_with(&self.root) {
            return Err(Rejection::Escape(path.to_string()));
        }
        if !canonical.is_file() {
            return Err(Rejection::NotFound(path.to_string()));
        }

        Ok(ResolvedFile {
            path: canonical,
            content_type,
        })
    }
}
