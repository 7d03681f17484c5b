use indexmap::IndexMap;
use thiserror::Error;

/// Error for a response status line without a numeric status code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("status line `{status}` does not start with a numeric status code")]
pub struct StatusLineError {
    /// The offending status line.
    pub status: String,
}

/// The response half of an access event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Status line, such as `200 OK`.
    pub status: String,

    /// Length of the response body in bytes, if known.
    pub response_length: Option<u64>,
}

impl Response {
    /// Creates a new `Response` with the given status line.
    pub fn new<S: Into<String>>(status: S) -> Self {
        Response { status: status.into(), response_length: None }
    }

    /// Sets the response body length.
    #[must_use]
    pub fn with_response_length(mut self, response_length: u64) -> Self {
        self.response_length = Some(response_length);
        self
    }

    /// Parses the status code from the first whitespace-delimited token of the status line.
    ///
    /// Any integer is accepted, not only the three-digit HTTP range.
    ///
    /// # Errors
    ///
    /// If the status line is empty or its first token isn't an integer, an error is returned.
    pub fn status_code(&self) -> Result<i64, StatusLineError> {
        self.status
            .split_whitespace()
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| StatusLineError { status: self.status.clone() })
    }
}

/// The request half of an access event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Request method, such as `GET`.
    pub method: String,

    /// Request path, without the query string.
    pub path: String,

    /// Query string, if any.
    pub query: Option<String>,

    /// Protocol version, such as `HTTP/1.1`.
    pub version: String,
}

impl Request {
    /// Creates a new `HTTP/1.1` request with the given method and path.
    pub fn new<M, P>(method: M, path: P) -> Self
    where
        M: Into<String>,
        P: Into<String>,
    {
        Request { method: method.into(), path: path.into(), query: None, version: "HTTP/1.1".to_string() }
    }

    /// Sets the query string.
    #[must_use]
    pub fn with_query<Q: Into<String>>(mut self, query: Q) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn with_version<V: Into<String>>(mut self, version: V) -> Self {
        self.version = version.into();
        self
    }

    /// Returns the request target: the path, followed by the query string when there is one.
    pub fn target(&self) -> String {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path.clone(),
        }
    }
}

/// Server-side variables describing the environment a request was handled in.
///
/// Keys follow CGI conventions, such as `REMOTE_ADDR` or `HTTP_USER_AGENT`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    vars: IndexMap<String, String>,
}

impl RequestContext {
    /// Creates an empty `RequestContext`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, replacing any previous value.
    #[must_use]
    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Returns the value of a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns the client address.
    pub fn remote_addr(&self) -> Option<&str> {
        self.get("REMOTE_ADDR")
    }

    /// Returns the client's user agent.
    pub fn user_agent(&self) -> Option<&str> {
        self.get("HTTP_USER_AGENT")
    }

    /// Returns the referer.
    pub fn referer(&self) -> Option<&str> {
        self.get("HTTP_REFERER")
    }
}

impl<K, V> FromIterator<(K, V)> for RequestContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RequestContext { vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}
