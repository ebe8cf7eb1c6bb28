//! Fetchers: the worker's only route to the network.

use std::time::Duration;

use async_trait::async_trait;
use sw_core::{FetchRequest, ResponseSnapshot};

use crate::timeout::TimeoutConfig;

/// Error type for fetch operations.
///
/// A response with a non-2xx status is not an error; it is returned as a
/// [`ResponseSnapshot`] and the caller decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network unavailable")]
    Offline,

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    /// Whether the error is transient and worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Offline | Self::Timeout(_) | Self::Connection(_))
    }
}

/// Something that can perform a network fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a request from the network and buffer the response.
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, FetchError>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: TimeoutConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default timeouts.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(TimeoutConfig::default())
    }

    /// Create a fetcher with explicit timeouts.
    pub fn with_timeout(timeout: TimeoutConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.connect)
            .timeout(timeout.total)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.total)
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, FetchError> {
        tracing::debug!(request_id = %request.id, method = %request.method, url = %request.url, "network fetch");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| match self.map_error(e) {
                FetchError::Request(msg) => FetchError::Body(msg),
                other => other,
            })?
            .to_vec();

        Ok(ResponseSnapshot {
            status,
            headers,
            body,
        })
    }
}

/// A fetcher with no network: every fetch fails with [`FetchError::Offline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, FetchError> {
        tracing::debug!(request_id = %request.id, url = %request.url, "offline, fetch refused");
        Err(FetchError::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_core::{Method, StatusCode, Url};
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_fetcher_buffers_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rooms"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<h1>Rooms</h1>"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = Url::parse(&format!("{}/rooms", server.uri())).unwrap();
        let response = fetcher.fetch(&FetchRequest::get(url)).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(response.text(), "<h1>Rooms</h1>");
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_error_status_as_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let response = fetcher.fetch(&FetchRequest::get(url)).await.unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(!response.is_ok());
    }

    #[tokio::test]
    async fn test_http_fetcher_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .and(body_string("name=Ada"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = Url::parse(&format!("{}/api/contact", server.uri())).unwrap();
        let request = FetchRequest::new(Method::POST, url).with_body("name=Ada");
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        let fetcher = HttpFetcher::with_timeout(TimeoutConfig::from_total(Duration::from_secs(2))).unwrap();
        let request = FetchRequest::parse_get("http://127.0.0.1:1/").unwrap();

        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_offline_fetcher_always_fails() {
        let request = FetchRequest::parse_get("https://hotel.example/").unwrap();
        assert_eq!(OfflineFetcher.fetch(&request).await, Err(FetchError::Offline));
    }
}
