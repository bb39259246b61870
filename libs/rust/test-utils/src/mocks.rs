//! Mock implementations for testing.
//!
//! [`MockTransport`] stands in for a provider: it records every state setup
//! call and request, and answers with canned responses.

use async_trait::async_trait;
use pact_verifier::{ProviderRequest, ProviderResponse, Transport};
use rust_common::PlatformError;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// A recorded state setup call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockSetupCall {
    /// Setup endpoint
    pub url: Url,
    /// Headers sent
    pub headers: Vec<(String, String)>,
    /// JSON payload
    pub payload: Value,
}

/// Recording provider transport.
#[derive(Debug, Clone)]
pub struct MockTransport {
    setup_status: Option<u16>,
    responses: Arc<RwLock<VecDeque<ProviderResponse>>>,
    default_response: Option<ProviderResponse>,
    setups: Arc<RwLock<Vec<MockSetupCall>>>,
    requests: Arc<RwLock<Vec<ProviderRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// A transport whose setup calls succeed and whose requests are refused.
    #[must_use]
    pub fn new() -> Self {
        Self {
            setup_status: Some(200),
            responses: Arc::new(RwLock::new(VecDeque::new())),
            default_response: None,
            setups: Arc::new(RwLock::new(Vec::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Answer state setup calls with `status`.
    #[must_use]
    pub const fn with_setup_status(mut self, status: u16) -> Self {
        self.setup_status = Some(status);
        self
    }

    /// Fail state setup calls with a connection error.
    #[must_use]
    pub const fn with_unreachable_setup(mut self) -> Self {
        self.setup_status = None;
        self
    }

    /// Answer every request with `response` once the queue is empty.
    #[must_use]
    pub fn with_default_response(mut self, response: ProviderResponse) -> Self {
        self.default_response = Some(response);
        self
    }

    /// Queue a response for the next request.
    pub async fn push_response(&self, response: ProviderResponse) {
        self.responses.write().await.push_back(response);
    }

    /// All recorded setup calls.
    pub async fn setups(&self) -> Vec<MockSetupCall> {
        self.setups.read().await.clone()
    }

    /// All recorded requests.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.read().await.clone()
    }

    /// Number of recorded requests.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn setup_state(
        &self,
        url: &Url,
        headers: &[(String, String)],
        payload: &Value,
    ) -> Result<u16, PlatformError> {
        self.setups.write().await.push(MockSetupCall {
            url: url.clone(),
            headers: headers.to_vec(),
            payload: payload.clone(),
        });
        self.setup_status
            .ok_or_else(|| PlatformError::unavailable("connection refused"))
    }

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, PlatformError> {
        self.requests.write().await.push(request.clone());
        if let Some(response) = self.responses.write().await.pop_front() {
            return Ok(response);
        }
        self.default_response
            .clone()
            .ok_or_else(|| PlatformError::unavailable("connection refused"))
    }
}

/// A JSON response with `status` and `body`.
#[must_use]
pub fn json_response(status: u16, body: &Value) -> ProviderResponse {
    ProviderResponse {
        status,
        headers: vec![(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        )],
        body: body.to_string().into_bytes(),
    }
}

/// A response without a body.
#[must_use]
pub const fn empty_response(status: u16) -> ProviderResponse {
    ProviderResponse {
        status,
        headers: Vec::new(),
        body: Vec::new(),
    }
}
