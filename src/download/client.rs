//! HTTP client wrapper for fetching directory and inventory documents.
//!
//! This module provides the `HttpClient` struct which issues single GET
//! requests with a bounded timeout and treats anything but HTTP 200 as a
//! failed attempt.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent;

/// HTTP client for fetching remote documents.
///
/// Created once per run and cloned into worker tasks; clones share the
/// underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use harvester_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let body = client.get_bytes("http://agency.gov/data.json").await?;
/// println!("fetched {} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with the default 120 second request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        HttpClientBuilder::new()
            .build()
            .expect("failed to build HTTP client with static configuration")
    }

    /// Returns a builder for clients with custom timeouts or pinned hosts.
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Fetches `url` and returns the raw body.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server answers with any status other than 200
    /// - Reading the body fails
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!(status, "non-200 response");
            return Err(FetchError::http_status(url, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        debug!(bytes = body.len(), "fetched body");
        Ok(body.to_vec())
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    request_timeout: Duration,
    connect_timeout: Duration,
    pinned_hosts: Vec<(String, SocketAddr)>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientBuilder {
    /// Creates a builder with the default timeouts and no pinned hosts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            pinned_hosts: Vec::new(),
        }
    }

    /// Sets the whole-request timeout. A timed out request is a failed attempt.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Resolves `host` to `addr` instead of using DNS.
    ///
    /// The port of `addr` is used for URLs that carry no explicit port.
    #[must_use]
    pub fn pin_host(mut self, host: impl Into<String>, addr: SocketAddr) -> Self {
        self.pinned_hosts.push((host.into(), addr));
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend or resolver
    /// cannot be initialized.
    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let client = self.client_builder().build()?;
        Ok(HttpClient { client })
    }

    fn client_builder(self) -> ClientBuilder {
        let mut builder = Client::builder()
            .connect_timeout(self.connect_timeout.min(self.request_timeout))
            .timeout(self.request_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent());

        // Pinned hosts must reach the pinned address, not an environment proxy.
        if !self.pinned_hosts.is_empty() {
            builder = builder.no_proxy();
        }
        for (host, addr) in &self.pinned_hosts {
            builder = builder.resolve(host, *addr);
        }
        builder
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_bytes_returns_body_on_200() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"dataset":[]}"#))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/data.json", mock_server.uri());
        let body = client.get_bytes(&url).await.unwrap();
        assert_eq!(body, br#"{"dataset":[]}"#);
    }

    #[tokio::test]
    async fn test_get_bytes_rejects_non_200_success_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/data.json", mock_server.uri());
        let result = client.get_bytes(&url).await;
        match result {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 204),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_bytes_invalid_url() {
        let client = HttpClient::new();
        let result = client.get_bytes("not-a-valid-url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_get_bytes_times_out_as_failed_attempt() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = HttpClient::builder()
            .request_timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let url = format!("{}/slow", mock_server.uri());
        let result = client.get_bytes(&url).await;
        assert!(
            matches!(result, Err(FetchError::Timeout { .. })),
            "expected timeout, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_pinned_host_routes_to_mock_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .and(header("host", "agency.gov"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pinned"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::builder()
            .pin_host("agency.gov", *mock_server.address())
            .build()
            .unwrap();
        let body = client.get_bytes("http://agency.gov/data.json").await.unwrap();
        assert_eq!(body, b"pinned");
    }
}
