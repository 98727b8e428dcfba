//! Protocol-level failures and the status each one is answered with.

use crate::http::response::{Response, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("missing Host header")]
    HostMissing,
    #[error("host not allowed: {0}")]
    HostRejected(String),
    #[error("method not allowed: {0}")]
    MethodUnsupported(String),
    #[error("path rejected: {0}")]
    PathRejected(String),
    #[error("resource not found: {0}")]
    ResourceMissing(String),
    #[error("unsupported media type: {0}")]
    TypeUnsupported(String),
    #[error("payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::MalformedRequest(_) | ServeError::HostMissing => StatusCode::BadRequest,
            ServeError::HostRejected(_) | ServeError::PathRejected(_) => StatusCode::Forbidden,
            ServeError::MethodUnsupported(_) => StatusCode::MethodNotAllowed,
            ServeError::ResourceMissing(_) => StatusCode::NotFound,
            ServeError::TypeUnsupported(_) => StatusCode::UnsupportedMediaType,
            ServeError::PayloadTooLarge { .. } => StatusCode::PayloadTooLarge,
            ServeError::Io(_) => StatusCode::InternalServerError,
        }
    }

    /// Client-facing message for the error page. I/O details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ServeError::Io(_) => "The server could not complete the request.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn to_response(&self) -> Response {
        Response::error(self.status(), &self.public_message())
    }
}
