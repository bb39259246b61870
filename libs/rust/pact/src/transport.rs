//! Provider transport.
//!
//! The orchestrator only needs two calls: drive the provider into a state,
//! and replay a request. [`HttpTransport`] does both over reqwest.

use async_trait::async_trait;
use reqwest::{Client, Method};
use rust_common::{HttpConfig, PlatformError, RetryPolicy, build_http_client};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

/// A request replayed against the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// HTTP method
    pub method: String,
    /// Absolute URL including query
    pub url: Url,
    /// Headers to send
    pub headers: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
}

/// What the provider answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Vec<u8>,
}

/// Transport to the provider under verification.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` with `headers` to the state setup endpoint and return
    /// the status.
    async fn setup_state(
        &self,
        url: &Url,
        headers: &[(String, String)],
        payload: &Value,
    ) -> Result<u16, PlatformError>;

    /// Send a request to the provider.
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, PlatformError>;
}

/// reqwest-backed transport.
///
/// State setup calls are retried on connection failures and 5xx answers;
/// interaction requests are sent once.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Build a transport from client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig, retry: RetryPolicy) -> Result<Self, PlatformError> {
        Ok(Self::with_client(build_http_client(config)?, retry))
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, headers, payload), fields(url = %url))]
    async fn setup_state(
        &self,
        url: &Url,
        headers: &[(String, String)],
        payload: &Value,
    ) -> Result<u16, PlatformError> {
        let client = &self.client;
        self.retry
            .execute(move || async move {
                let mut builder = client.post(url.clone()).json(payload);
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                let response = builder.send().await?;
                let status = response.status();
                if status.is_server_error() {
                    return Err(PlatformError::unavailable(format!(
                        "state setup answered {status}"
                    )));
                }
                debug!(status = status.as_u16(), "state setup answered");
                Ok(status.as_u16())
            })
            .await
    }

    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, PlatformError> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| PlatformError::invalid_input(format!("method {:?}: {e}", request.method)))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "provider answered");

        Ok(ProviderResponse {
            status,
            headers,
            body,
        })
    }
}
