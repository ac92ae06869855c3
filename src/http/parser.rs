use crate::http::line::{LineError, LineReader};
use crate::http::request::{HTTP_VERSION, Method, Request, canonical_header_key};
use std::collections::HashMap;
use tokio::io::AsyncRead;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Line(#[from] LineError),

    #[error("malformed request line {0:?}")]
    InvalidRequest(String),

    #[error("unsupported method {0:?}")]
    InvalidMethod(String),

    #[error("invalid request target {0:?}")]
    InvalidTarget(String),

    #[error("unsupported protocol version {0:?}")]
    InvalidVersion(String),

    #[error("malformed header line {0:?}")]
    InvalidHeader(String),

    #[error("missing Host header")]
    MissingHost,
}

/// A failed attempt to read a request.
///
/// `bytes_seen` records whether anything arrived from the peer before the
/// failure, which separates an idle connection from an abandoned request.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RequestError {
    pub bytes_seen: bool,
    #[source]
    pub error: ParseError,
}

impl RequestError {
    fn new(bytes_seen: bool, error: impl Into<ParseError>) -> Self {
        Self {
            bytes_seen,
            error: error.into(),
        }
    }
}

/// Reads the next request from `lines`.
///
/// Nothing is returned for a request that fails validation; the first
/// failure wins and ends parsing.
pub async fn read_request<S>(lines: &mut LineReader<S>) -> Result<Request, RequestError>
where
    S: AsyncRead + Unpin,
{
    let request_line = match lines.read_line().await {
        Ok(line) => line,
        Err(e) => return Err(RequestError::new(lines.has_partial(), e)),
    };

    let (method, path, version) =
        parse_request_line(&request_line).map_err(|e| RequestError::new(true, e))?;

    let mut headers = HashMap::new();
    let mut host = None;
    let mut close = false;

    loop {
        let line = lines
            .read_line()
            .await
            .map_err(|e| RequestError::new(true, e))?;

        // Empty line terminates the header block
        if line.is_empty() {
            break;
        }

        let (key, value) = parse_header_line(&line).map_err(|e| RequestError::new(true, e))?;

        match key.as_str() {
            "Host" => host = Some(value),
            "Connection" => {
                if value == "close" {
                    close = true;
                }
            }
            _ => {
                headers.insert(key, value);
            }
        }
    }

    let host = host.ok_or_else(|| RequestError::new(true, ParseError::MissingHost))?;

    Ok(Request {
        method,
        path,
        version,
        headers,
        host,
        close,
    })
}

/// Splits a request line into method, target and version, validating each in
/// that order.
pub fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
    let fields: Vec<&str> = line.split(' ').collect();
    let [method, path, version] = fields[..] else {
        return Err(ParseError::InvalidRequest(line.to_string()));
    };

    let method = Method::from_str(method).ok_or_else(|| ParseError::InvalidMethod(method.to_string()))?;

    if !path.starts_with('/') {
        return Err(ParseError::InvalidTarget(path.to_string()));
    }

    if version != HTTP_VERSION {
        return Err(ParseError::InvalidVersion(version.to_string()));
    }

    Ok((method, path.to_string(), version.to_string()))
}

/// Splits a header line on its first `:` into a canonical name and a trimmed
/// value.
pub fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(ParseError::InvalidHeader(line.to_string()));
    }

    Ok((canonical_header_key(key), value.trim().to_string()))
}
