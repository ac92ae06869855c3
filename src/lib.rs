//! Lantern - Static File HTTP Server
//!
//! Core library for the GET-only HTTP/1.1 request/response loop.

pub mod config;
pub mod http;
pub mod server;
