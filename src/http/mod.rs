//! HTTP protocol implementation.
//!
//! # Architecture
//!
//! - **`connection`**: drives one client socket through the request-response cycle
//! - **`parser`**: incremental request parser fed from a [`ByteBuffer`](crate::buffer::ByteBuffer)
//! - **`request`**: the parsed request record
//! - **`form`**: url-encoded form body decoding
//! - **`response`**: status resolution and response serialization with zero-copy file bodies
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Parse bytes as they arrive
//!        └──────┬──────┘
//!               │ Request complete (or malformed → 400)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Probe the file, build headers, map the body
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send headers + mapped file, then unmap
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```
//!
//! The parser's own states (`RequestLine → Headers → Body → Finish`) live in
//! [`parser::ParseState`].

pub mod connection;
pub mod form;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
