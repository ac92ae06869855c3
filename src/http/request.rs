use std::collections::HashMap;

/// The only protocol version accepted on the request line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP request methods.
///
/// The server serves static files only, so GET is the single supported verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
}

/// Represents a parsed HTTP request from a client.
///
/// `Host` and `Connection` never appear in `headers`; they are lifted into
/// `host` and `close`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target (e.g., "/index.html"), always starting with `/`
    pub path: String,
    /// HTTP version, always [`HTTP_VERSION`]
    pub version: String,
    /// Remaining headers keyed by canonical name, values trimmed
    pub headers: HashMap<String, String>,
    /// Value of the `Host` header
    pub host: String,
    /// True iff the client sent `Connection: close`
    pub close: bool,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    path: Option<String>,
    host: Option<String>,
    headers: HashMap<String, String>,
    close: bool,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive.
    ///
    /// ```
    /// # use lantern::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("POST"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            host: None,
            headers: HashMap::new(),
            close: false,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(canonical_header_key(key), value.into());
        self
    }

    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: Method::GET,
            path: self.path.ok_or("path missing")?,
            version: HTTP_VERSION.to_string(),
            headers: self.headers,
            host: self.host.ok_or("host missing")?,
            close: self.close,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by name, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_key(key))
            .map(|v| v.as_str())
    }

    /// Whether the connection should stay open after this request is served.
    pub fn keep_alive(&self) -> bool {
        !self.close
    }
}

/// Returns the canonical form of a header name.
///
/// The first letter and every letter following a `-` are upper-cased, the
/// rest lower-cased: `content-type` becomes `Content-Type`. Names containing
/// anything besides ASCII letters, digits and `-` are returned unchanged.
///
/// ```
/// # use lantern::http::request::canonical_header_key;
/// assert_eq!(canonical_header_key("content-TYPE"), "Content-Type");
/// assert_eq!(canonical_header_key("x_custom"), "x_custom");
/// ```
pub fn canonical_header_key(name: &str) -> String {
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}
