//! HTTP protocol implementation.
//!
//! This module implements an HTTP/1.1 server with keep-alive connections,
//! a public-folder file transmitter and a client mode for single exchanges.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`atom`**: Reference-counted immutable strings shared across requests
//! - **`headers`**: The canonical header registry and per-request header storage
//! - **`mime`**: MIME type detection based on file extensions
//! - **`request`** / **`response`**: Message representations with builders
//! - **`parser`**: Parses requests (and client-mode responses) from byte buffers
//! - **`dispatch`**: Decides which callback handles a parsed message
//! - **`error`**: Error pages, including reports on connections without a request
//! - **`transport`**: The synchronous send interface dispatch code writes to
//! - **`static_files`**: Serves files from the listener's public folder
//! - **`connection`**: The per-connection request-response state machine
//! - **`writer`**: Serializes and writes messages to the peer
//! - **`client`**: Client mode
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received (malformed → error report, close)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← RequestDispatcher picks one branch
//!        └──────┬───────────┘
//!               │ Responses queued
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod atom;
pub mod headers;
pub mod mime;
mod mime_table;
pub mod request;
pub mod response;
pub mod parser;
pub mod transport;
pub mod error;
pub mod dispatch;
pub mod static_files;
pub mod connection;
pub mod writer;
pub mod client;
