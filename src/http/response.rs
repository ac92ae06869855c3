use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::File;

use crate::http::date::format_http_date;
use crate::http::mime::mime_type_for_path;
use crate::http::request::{HTTP_VERSION, Request};

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File found and served
/// - `BadRequest` (400): Malformed or incomplete request
/// - `NotFound` (404): No servable file for the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// A file opened for a 200 response.
///
/// `len` is the size observed when the file was opened; the writer sends at
/// most that many bytes.
#[derive(Debug)]
pub struct FileBody {
    pub path: PathBuf,
    pub file: File,
    pub len: u64,
}

/// A complete HTTP response ready to be written to a client.
#[derive(Debug)]
pub struct Response {
    /// Protocol version for the status line
    pub version: &'static str,
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers, kept sorted so they serialize in a stable order
    pub headers: BTreeMap<String, String>,
    /// Present only on success
    pub body: Option<FileBody>,
    /// Request this responds to; `None` when no request could be parsed
    pub request: Option<Request>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::NotFound)
///     .header("Connection", "close")
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: BTreeMap<String, String>,
    body: Option<FileBody>,
    request: Option<Request>,
}

impl ResponseBuilder {
    /// Creates a builder carrying a `Date` header for the current time.
    pub fn new(status: StatusCode) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Date".to_string(), format_http_date(SystemTime::now()));

        Self {
            status,
            headers,
            body: None,
            request: None,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: FileBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Associates the request, echoing `Connection: close` if it asked to close.
    pub fn request(mut self, request: Request) -> Self {
        if request.close {
            self.headers
                .insert("Connection".to_string(), "close".to_string());
        }
        self.request = Some(request);
        self
    }

    pub fn build(self) -> Response {
        Response {
            version: HTTP_VERSION,
            status: self.status,
            headers: self.headers,
            body: self.body,
            request: self.request,
        }
    }
}

impl Response {
    /// Creates a 200 OK response serving `file`.
    ///
    /// `metadata` must come from the same open handle so the advertised length
    /// matches what the writer will stream.
    pub fn ok(request: Request, path: PathBuf, file: File, metadata: &Metadata) -> Self {
        let mut builder = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", mime_type_for_path(&path))
            .header("Content-Length", metadata.len().to_string());

        if let Ok(modified) = metadata.modified() {
            builder = builder.header("Last-Modified", format_http_date(modified));
        }

        builder
            .request(request)
            .body(FileBody {
                path,
                file,
                len: metadata.len(),
            })
            .build()
    }

    /// Creates a 400 Bad Request response. The connection is always closed
    /// afterwards.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest)
            .header("Connection", "close")
            .build()
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(request: Option<Request>) -> Self {
        let mut builder = ResponseBuilder::new(StatusCode::NotFound);
        if let Some(request) = request {
            builder = builder.request(request);
        }
        builder.build()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.body.as_ref().map(|b| b.path.as_path())
    }
}
