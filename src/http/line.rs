//! Line-oriented reading with an idle deadline.
//!
//! [`LineReader`] owns the connection stream and a receive buffer. Every call
//! to [`LineReader::read_line`] is bounded by the deadline most recently armed
//! with [`LineReader::arm_deadline`], so a single deadline covers a whole
//! request (request line and headers) rather than each line separately.

use bytes::{Buf, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Instant, timeout_at};

/// Longest line accepted before the terminator, in bytes.
pub const MAX_LINE_LEN: usize = 8 * 1024;

const READ_CHUNK: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("connection closed by peer")]
    Closed,

    #[error("read deadline exceeded")]
    TimedOut,

    #[error("line exceeds maximum length")]
    TooLong,

    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct LineReader<S> {
    stream: S,
    buffer: BytesMut,
    deadline: Option<Instant>,
}

impl<S> LineReader<S>
where
    S: AsyncRead + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            deadline: None,
        }
    }

    /// Sets the deadline for all following reads to `now + idle`.
    pub fn arm_deadline(&mut self, idle: Duration) {
        self.deadline = Some(Instant::now() + idle);
    }

    /// Whether bytes of an unterminated line are sitting in the buffer.
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Reads one line and returns it without its CRLF (or bare LF) terminator.
    pub async fn read_line(&mut self) -> Result<String, LineError> {
        // Only bytes appended since the last pass need scanning.
        let mut scanned = 0;

        loop {
            if let Some(pos) = self.buffer[scanned..].iter().position(|&b| b == b'\n') {
                return self.take_line(scanned + pos);
            }
            scanned = self.buffer.len();

            if self.buffer.len() > MAX_LINE_LEN {
                return Err(LineError::TooLong);
            }

            let n = self.fill().await?;
            if n == 0 {
                return Err(LineError::Closed);
            }
        }
    }

    async fn fill(&mut self) -> Result<usize, LineError> {
        self.buffer.reserve(READ_CHUNK);
        let read = self.stream.read_buf(&mut self.buffer);

        let n = match self.deadline {
            Some(deadline) => timeout_at(deadline, read)
                .await
                .map_err(|_| LineError::TimedOut)??,
            None => read.await?,
        };

        Ok(n)
    }

    fn take_line(&mut self, newline: usize) -> Result<String, LineError> {
        let mut line = self.buffer.split_to(newline);
        self.buffer.advance(1);

        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if line.len() > MAX_LINE_LEN {
            return Err(LineError::TooLong);
        }

        String::from_utf8(line.to_vec()).map_err(|_| LineError::InvalidUtf8)
    }
}
