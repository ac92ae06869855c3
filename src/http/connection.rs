use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::http::line::{LineError, LineReader};
use crate::http::parser::{ParseError, RequestError, read_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::docroot::DocRoot;

/// How long a connection may sit without delivering a complete request.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Connection<S = TcpStream> {
    lines: LineReader<S>,
    docroot: Arc<DocRoot>,
    idle_timeout: Duration,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitingRequest,
    Parsing,
    Dispatching(Request),
    Writing(ResponseWriter, bool), // bool = close afterwards
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, docroot: Arc<DocRoot>) -> Self {
        Self::with_idle_timeout(stream, docroot, IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(stream: S, docroot: Arc<DocRoot>, idle_timeout: Duration) -> Self {
        Self {
            lines: LineReader::new(stream),
            docroot,
            idle_timeout,
            state: ConnectionState::AwaitingRequest,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitingRequest => {
                    // One deadline covers the request line and all headers
                    self.lines.arm_deadline(self.idle_timeout);
                    self.state = ConnectionState::Parsing;
                }

                ConnectionState::Parsing => {
                    self.state = match read_request(&mut self.lines).await {
                        Ok(req) => ConnectionState::Dispatching(req),
                        Err(e) => Self::reject(e),
                    };
                }

                ConnectionState::Dispatching(req) => {
                    let close = req.close;
                    let path = req.path.clone();
                    let response = self.docroot.dispatch(req).await;

                    info!(
                        %path,
                        status = response.status.as_u16(),
                        close,
                        "Serving request"
                    );

                    self.state = ConnectionState::Writing(ResponseWriter::new(response), close);
                }

                ConnectionState::Writing(mut writer, close) => {
                    if let Err(e) = writer.write_to_stream(self.lines.get_mut()).await {
                        warn!(error = %e, "Failed to write response");
                    }

                    if close {
                        self.state = ConnectionState::Closed;
                    } else {
                        self.state = ConnectionState::AwaitingRequest; // go back for next request
                    }
                }

                ConnectionState::Closed => {
                    let _ = self.lines.get_mut().shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Decides what a failed read turns into: a silent close for a peer that
    /// left or went idle, a 400 for anything that started a request.
    fn reject(e: RequestError) -> ConnectionState {
        match (&e.error, e.bytes_seen) {
            (ParseError::Line(LineError::Closed), false) => {
                debug!("Peer closed connection");
                ConnectionState::Closed
            }
            (ParseError::Line(LineError::TimedOut), false) => {
                debug!("Idle timeout");
                ConnectionState::Closed
            }
            _ => {
                warn!(error = %e, bytes_seen = e.bytes_seen, "Rejecting bad request");
                ConnectionState::Writing(ResponseWriter::new(Response::bad_request()), true)
            }
        }
    }
}
