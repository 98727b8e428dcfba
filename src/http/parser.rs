use crate::http::request::{Method, Request};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
    #[error("malformed request line: {0:?}")]
    InvalidRequestLine(String),
}

/// Parses one request out of a single read buffer.
///
/// The buffer is not length-delimited: everything after the first blank line
/// is taken as the body, regardless of `Content-Length`.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    if buf.is_empty() {
        return Err(ParseError::Empty);
    }

    let (head, body) = match find_headers_end(buf) {
        Some(end) => (&buf[..end], &buf[end + 4..]),
        None => (buf, &[][..]),
    };

    let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;
    let mut lines = head.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let (method, path, version) = split_request_line(request_line)
        .ok_or_else(|| ParseError::InvalidRequestLine(request_line.to_string()))?;

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            break;
        }

        if let Some((key, value)) = parse_header_line(line) {
            headers.entry(key).or_insert(value);
        }
    }

    Ok(Request {
        method: Method::from_token(method),
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: body.to_vec(),
    })
}

/// Splits a `Key: Value` line on its first colon. Lines without a colon are
/// not headers and yield `None`.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
}

fn split_request_line(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.split(' ');
    let method = parts.next()?;
    let path = parts.next()?;
    let version = parts.next()?;

    if parts.next().is_some() || method.is_empty() || path.is_empty() || version.is_empty() {
        return None;
    }

    Some((method, path, version))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}
