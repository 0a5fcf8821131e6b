use std::fmt;

use crate::http::atom::Atom;
use crate::http::dispatch::Udata;
use crate::http::headers::{HeaderMap, HeaderValue};
use crate::http::response::StatusCode;

/// HTTP request methods.
///
/// Represents the HTTP method/verb of a request. The static file transmitter
/// only serves GET and HEAD; everything else reaches the application handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH
}

/// One HTTP transaction.
///
/// On the server side this is a parsed request. In client mode the same type
/// carries a received response: `status` is set and `headers` holds the
/// response headers, while `method` and `path` echo the request that was sent.
#[derive(Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path/URL (e.g., "/index.html")
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Headers keyed by lowercase name
    pub headers: HeaderMap,
    /// Request body for POST/PUT requests
    pub body: Vec<u8>,
    /// Response status, client mode only
    pub status: Option<StatusCode>,
    /// Listener-supplied user data, reset before every dispatch
    pub udata: Option<Udata>,
    /// Upgrade protocol resolved by the dispatcher
    pub upgrade: Option<Atom>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Example
    ///
    /// ```
    /// # use gatehouse::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: HeaderMap::new(),
            body: Vec::new()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Appends a header. Names are lowercased; repeating a name keeps every
    /// value in order.
    pub fn header(mut self, key: &str, value: impl Into<Atom>) -> Self {
        self.headers
            .append(Atom::from(key.to_ascii_lowercase()), value.into());
        self
    }

    /// Appends a header whose name is already a (canonical) atom.
    pub fn header_atom(mut self, name: Atom, value: impl Into<Atom>) -> Self {
        self.headers.append(name, value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
            body: self.body,
            status: None,
            udata: None,
            upgrade: None,
        })
    }

}

impl Request {
    /// Retrieves the last value of a header, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        let value = match self.headers.get_str(key) {
            Some(value) => value,
            None => self.headers.get_str(&key.to_ascii_lowercase())?,
        };
        value.last().map(Atom::as_str)
    }

    /// Every value of a header in arrival order.
    pub fn header_values(&self, key: &str) -> Option<&HeaderValue> {
        self.headers.get_str(&key.to_ascii_lowercase())
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` is sent;
    /// HTTP/1.0 requires an explicit `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        match self.header("connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version != "HTTP/1.0",
        }
    }

    /// Downcasts the user data slot.
    pub fn udata_as<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.udata.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("status", &self.status)
            .field("udata", &self.udata.is_some())
            .field("upgrade", &self.upgrade)
            .finish()
    }
}
