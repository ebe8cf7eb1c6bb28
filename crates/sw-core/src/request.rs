//! Intercepted request model.

use std::sync::atomic::{AtomicU32, Ordering};

use http::header::{HeaderName, HeaderValue, ACCEPT};
use http::{HeaderMap, Method};
use url::Url;

/// Unique identifier for an intercepted request, used for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let id = format!(
            "{:x}-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request as seen at the worker's intercept point.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request identifier.
    pub id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body (empty for GET).
    pub body: Vec<u8>,
}

impl FetchRequest {
    /// Create a request with the given method and URL.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            id: RequestId::generate(),
            method,
            url,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parse a URL string and create a GET request.
    pub fn parse_get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::get(Url::parse(url)?))
    }

    /// Create a GET navigation request that accepts HTML.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_header(ACCEPT, HeaderValue::from_static(HTML_ACCEPT))
    }

    /// Add a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether the `Accept` header asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains("text/html"))
    }

    /// Whether the URL uses the `http` or `https` scheme.
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    /// Whether this is a GET request.
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Build a GET request for another path on the same origin.
    ///
    /// The `Accept` header is carried over so HTML lookups stay HTML lookups.
    pub fn sibling(&self, path: &str) -> Result<Self, url::ParseError> {
        let url = self.url.join(path)?;
        let mut request = Self::get(url);
        if let Some(accept) = self.headers.get(ACCEPT) {
            request.headers.insert(ACCEPT, accept.clone());
        }
        Ok(request)
    }
}

/// Accept header value browsers send for top-level navigations.
pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
