//! HTTP/1.1 protocol implementation for a GET-only static file server.
//!
//! # Architecture
//!
//! - **`line`**: Buffered CRLF line reader carrying the idle-read deadline
//! - **`parser`**: Reads and validates one request from a [`line::LineReader`]
//! - **`request`**: HTTP request representation and header-name canonicalization
//! - **`response`**: Response representation with the 200/400/404 constructors
//! - **`writer`**: Serializes a response and streams its file body
//! - **`connection`**: The per-connection request/response state machine
//! - **`date`**: HTTP-date formatting
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← Arm idle deadline
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Parsing      │ ← Read request line + headers
//!        └──────┬───────────┘
//!               │ ├─ Peer closed / idle, nothing sent → Closed
//!               │ └─ Malformed / partial → Writing(400, close)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Map target onto the document root
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Writing      │ ← Send 200 or 404
//!        └──────┬───────────┘
//!               ├─ Keep-Alive → AwaitingRequest (same connection)
//!               └─ Connection: close → Closed
//! ```

pub mod connection;
pub mod date;
pub mod line;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
