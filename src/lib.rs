//! TinyWeb - static file server
//!
//! Core library: byte buffer, incremental HTTP/1.1 parsing and
//! memory-mapped file responses.

pub mod auth;
pub mod buffer;
pub mod config;
pub mod http;
pub mod server;
