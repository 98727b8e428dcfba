use std::collections::HashMap;

use fileserver::http::parser::parse_header_line;
use fileserver::http::response::{KeepAlive, Response, ResponseBuilder, StatusCode};
use fileserver::http::writer::{ResponseWriter, serialize_response};

#[test]
fn test_status_code_table() {
    let table = [
        (StatusCode::Ok, 200, "OK"),
        (StatusCode::Created, 201, "Created"),
        (StatusCode::BadRequest, 400, "Bad Request"),
        (StatusCode::Forbidden, 403, "Forbidden"),
        (StatusCode::NotFound, 404, "Not Found"),
        (StatusCode::MethodNotAllowed, 405, "Method Not Allowed"),
        (StatusCode::UnsupportedMediaType, 415, "Unsupported Media Type"),
        (StatusCode::InternalServerError, 500, "Internal Server Error"),
        (StatusCode::ServiceUnavailable, 503, "Service Unavailable"),
    ];

    for (status, code, reason) in table {
        assert_eq!(status.as_u16(), code);
        assert_eq!(status.reason_phrase(), reason);
        assert_eq!(StatusCode::from_u16(code), status);
    }
}

#[test]
fn test_unknown_status_renders_unknown() {
    let response = ResponseBuilder::new(StatusCode::from_u16(299)).build();
    let wire = serialize_response(&response);

    assert!(wire.starts_with(b"HTTP/1.1 299 Unknown\r\n"));
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    assert_eq!(response.header("Content-Length"), Some(body.len().to_string().as_str()));
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("content-length"), Some("999"));
    assert_eq!(response.headers.len(), 1);
}

#[test]
fn test_header_order_is_preserved() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/html")
        .header("X-First", "1")
        .header("X-Second", "2")
        .header("content-type", "text/plain")
        .body("hi")
        .build();

    let names: Vec<&str> = response.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, ["Content-Type", "X-First", "X-Second", "Content-Length"]);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));

    let wire = String::from_utf8(serialize_response(&response)).unwrap();
    assert_eq!(
        wire,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nX-First: 1\r\nX-Second: 2\r\nContent-Length: 2\r\n\r\nhi"
    );
}

#[test]
fn test_connection_headers() {
    let open = ResponseBuilder::new(StatusCode::Ok)
        .connection(Some(KeepAlive { timeout_secs: 30, max: 100 }))
        .build();
    assert_eq!(open.header("Connection"), Some("keep-alive"));
    assert_eq!(open.header("Keep-Alive"), Some("timeout=30, max=100"));
    assert!(open.keeps_alive());

    let closed = ResponseBuilder::new(StatusCode::Ok).connection(None).build();
    assert_eq!(closed.header("Connection"), Some("close"));
    assert!(closed.header("Keep-Alive").is_none());
    assert!(!closed.keeps_alive());
}

#[test]
fn test_error_page() {
    let response = Response::error(StatusCode::NotFound, "no such file");
    let body = String::from_utf8(response.body.clone()).unwrap();

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(body.contains("404 Not Found"));
    assert!(body.contains("no such file"));
    assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
    assert_eq!(response.header("Connection"), Some("close"));
    assert!(response.header("Retry-After").is_none());
}

#[test]
fn test_503_carries_retry_after() {
    let response = Response::error(StatusCode::ServiceUnavailable, "busy");
    assert_eq!(response.header("Retry-After"), Some("10"));
}

#[test]
fn test_binary_body_passes_through() {
    let body = vec![0u8, 159, 146, 150, 255];
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();
    let wire = serialize_response(&response);

    assert!(wire.ends_with(&body));
}

#[test]
fn test_framed_headers_reparse_to_same_mapping() {
    let response = ResponseBuilder::new(StatusCode::Created)
        .header("Content-Type", "application/json")
        .header("Date", "Sun, 06 Nov 1994 08:49:37 GMT")
        .header("Location", "http://localhost:8080/uploads/a.json")
        .connection(Some(KeepAlive { timeout_secs: 30, max: 100 }))
        .body("{}")
        .build();

    let wire = String::from_utf8(serialize_response(&response)).unwrap();
    let head = wire.split("\r\n\r\n").next().unwrap();
    let reparsed: HashMap<String, String> =
        head.split("\r\n").skip(1).filter_map(parse_header_line).collect();

    let expected: HashMap<String, String> = response
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect();
    assert_eq!(reparsed, expected);
}

#[tokio::test]
async fn test_writer_sends_every_byte() {
    let body = vec![b'x'; 100_000];
    let response = ResponseBuilder::new(StatusCode::Ok).body(body).build();
    let expected = serialize_response(&response);

    let (mut client, mut server) = tokio::io::duplex(1024);
    let reader = tokio::spawn(async move {
        let mut out = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut client, &mut out).await.unwrap();
        out
    });

    ResponseWriter::new(&response).write_to_stream(&mut server).await.unwrap();
    drop(server);

    assert_eq!(reader.await.unwrap(), expected);
}
