//! Gatehouse - HTTP/1.1 server core
//!
//! Request dispatch, canonical header and MIME registries, static file
//! serving and the connection plumbing around them.

pub mod config;
pub mod http;
pub mod server;
