//! Keep-alive file server
//!
//! Core library: admission control, HTTP session handling, sandboxed file
//! serving and JSON uploads.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
