//! HTTP protocol implementation.
//!
//! This module implements the restricted HTTP/1.1 dialect the server speaks:
//! keep-alive connections, whole-body transfers, no chunked encoding.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection session implementing the request-response state machine
//! - **`parser`**: Parses one request out of a single read buffer
//! - **`request`**: HTTP request representation and keep-alive policy
//! - **`response`**: Status table, response builder and error pages
//! - **`writer`**: Frames and writes responses to the client
//! - **`host`**: Host header validation
//! - **`error`**: Protocol errors and their status codes
//! - **`mime`**: The fixed content-type table
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← One read of up to 8 KiB, 30 s timeout
//!        └──────┬──────┘
//!               │ Bytes received (EOF / timeout / error → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │     Parsed       │ ← Host check, GET/POST routing
//!        └──────┬───────────┘     (malformed → 400, then Closed)
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │     Routed       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive and < 100 requests → Reading
//!               └─ otherwise → Closed
//! ```

pub mod connection;
pub mod error;
pub mod host;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
