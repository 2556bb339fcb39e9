//! Request and response values
//!
//! Both are plain immutable values: a request is built once and handed to a
//! transport by reference, a response is produced once by the transport.

use bytes::Bytes;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Errors building a request
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

/// A GET request against an absolute http(s) URL
///
/// Query parameters given with [`ApiRequest::with_query`] are appended to any
/// query already present in the URL, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    url: Url,
    query: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create a GET request for an absolute URL
    ///
    /// # Example
    /// ```
    /// use apicheck::client::ApiRequest;
    ///
    /// let request = ApiRequest::get("https://reqres.in/api/users")
    ///     .unwrap()
    ///     .with_query("page", "2");
    /// assert_eq!(request.full_url().as_str(), "https://reqres.in/api/users?page=2");
    /// ```
    pub fn get(url: &str) -> Result<Self, RequestError> {
        let url = Url::parse(url)?;
        match url.scheme() {
            "http" | "https" => Ok(Self {
                url,
                query: Vec::new(),
            }),
            other => Err(RequestError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Create a GET request from a base URL and a path
    ///
    /// The path is appended to whatever path the base URL already has, so a
    /// base of `https://host/v1` and a path of `/users` address `/v1/users`.
    pub fn from_parts(base_url: &str, path: &str) -> Result<Self, RequestError> {
        let base = base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            Self::get(base)
        } else {
            Self::get(&format!("{base}/{path}"))
        }
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// HTTP method, always GET
    pub fn method(&self) -> &'static str {
        "GET"
    }

    /// The URL as configured, without the extra query parameters
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Extra query parameters
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The URL actually requested, with query parameters applied
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.full_url())
    }
}

/// A received HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl ApiResponse {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace all headers
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers in received order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, with invalid UTF-8 replaced
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
