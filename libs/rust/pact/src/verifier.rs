//! Verification orchestrator.
//!
//! For each interaction: set up provider states, replay the request, compare
//! the answer. Every outcome goes through the sink; one interaction failing
//! never stops the next one from running.

use rust_common::{PlatformError, RetryPolicy};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::compare::{compare, compare_headers};
use crate::config::VerifierConfig;
use crate::contract::{Contract, Interaction, Request, header_text};
use crate::path::Path;
use crate::result::ResultSink;
use crate::transport::{HttpTransport, ProviderRequest, ProviderResponse, Transport};
use crate::verification::{
    InteractionOutcome, InteractionPhase, VerificationResult, VerificationSummary,
};

/// Replays contracts against a provider.
pub struct Verifier<T: Transport> {
    config: VerifierConfig,
    transport: T,
}

impl Verifier<HttpTransport> {
    /// Verifier talking HTTP as configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: VerifierConfig) -> Result<Self, PlatformError> {
        let transport = HttpTransport::new(&config.http, RetryPolicy::new(config.retry.clone()))?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> Verifier<T> {
    /// Verifier over an arbitrary transport.
    #[must_use]
    pub const fn new(config: VerifierConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// The transport in use.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Verify every contract whose consumer passes the configured filter.
    #[instrument(skip_all, fields(provider = %self.config.provider_name))]
    pub async fn verify_all(
        &self,
        contracts: &[Contract],
        sink: &mut (dyn ResultSink + Send),
    ) -> VerificationSummary {
        let mut results = Vec::new();
        for contract in contracts {
            if !self.config.accepts_consumer(&contract.consumer.name) {
                debug!(consumer = %contract.consumer.name, "skipping filtered consumer");
                continue;
            }
            results.push(self.verify_contract(contract, sink).await);
        }
        let summary = VerificationSummary::from_results(results);
        info!(success = summary.success, "{}", summary.reason);
        summary
    }

    /// Verify every interaction of `contract`, in order.
    #[instrument(skip_all, fields(consumer = %contract.consumer.name))]
    pub async fn verify_contract(
        &self,
        contract: &Contract,
        sink: &mut (dyn ResultSink + Send),
    ) -> VerificationResult {
        let mut outcomes = Vec::with_capacity(contract.interactions.len());
        for interaction in &contract.interactions {
            outcomes.push(
                self.verify_interaction(&contract.consumer.name, interaction, sink)
                    .await,
            );
        }
        let result = VerificationResult::new(
            contract.provider.name.clone(),
            contract.consumer.name.clone(),
            outcomes,
        );
        info!(
            success = result.success,
            interactions = result.interactions.len(),
            "contract verified"
        );
        result
    }

    /// Verify a single interaction and end the sink for it.
    #[instrument(skip_all, fields(interaction = %interaction.description))]
    pub async fn verify_interaction(
        &self,
        consumer: &str,
        interaction: &Interaction,
        sink: &mut (dyn ResultSink + Send),
    ) -> InteractionOutcome {
        sink.start(consumer, interaction);
        let reached = self.run_phases(consumer, interaction, sink).await;
        let success = sink.success();
        sink.end();
        debug!(phase = ?InteractionPhase::Done, success, "interaction finished");

        InteractionOutcome {
            description: interaction.description.clone(),
            success,
            reached: if reached == InteractionPhase::Compared {
                InteractionPhase::Done
            } else {
                reached
            },
        }
    }

    async fn run_phases(
        &self,
        consumer: &str,
        interaction: &Interaction,
        sink: &mut (dyn ResultSink + Send),
    ) -> InteractionPhase {
        debug!(phase = ?InteractionPhase::Pending);
        if !self.setup_states(consumer, interaction, sink).await {
            return InteractionPhase::Pending;
        }
        debug!(phase = ?InteractionPhase::StateSetupDone);

        let request = self.provider_request(&interaction.request);
        let actual = match self.transport.send(&request).await {
            Ok(actual) => actual,
            Err(e) => {
                sink.fail(
                    &format!("request failed: {e}"),
                    Some(&Path::root(interaction.request.path.clone())),
                );
                return InteractionPhase::StateSetupDone;
            }
        };
        debug!(phase = ?InteractionPhase::RequestSent, status = actual.status);

        self.compare_response(interaction, &actual, sink);
        debug!(phase = ?InteractionPhase::Compared);
        InteractionPhase::Compared
    }

    /// Returns whether the interaction may proceed.
    async fn setup_states(
        &self,
        consumer: &str,
        interaction: &Interaction,
        sink: &mut (dyn ResultSink + Send),
    ) -> bool {
        if interaction.provider_states.is_empty() {
            return true;
        }
        let Some(setup_url) = &self.config.provider_setup_url else {
            sink.warn("no provider state setup URL configured; states not set up");
            return true;
        };

        let names: Vec<&str> = interaction
            .provider_states
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        for state in &interaction.provider_states {
            let payload = json!({
                "provider": self.config.provider_name,
                "consumer": consumer,
                "state": state.name,
                "states": names,
                "params": state.params,
            });
            let failure = match self
                .transport
                .setup_state(setup_url, &self.config.custom_headers, &payload)
                .await
            {
                Ok(status) if (200..300).contains(&status) => None,
                Ok(status) => Some(format!("setup endpoint answered {status}")),
                Err(e) => Some(e.to_string()),
            };
            if let Some(reason) = failure {
                warn!(state = %state.name, %reason, "provider state setup failed");
                sink.fail(&format!("Invalid provider state {:?}: {reason}", state.name), None);
                return false;
            }
        }
        true
    }

    fn provider_request(&self, request: &Request) -> ProviderRequest {
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .filter(|(name, _)| {
                !self
                    .config
                    .custom_headers
                    .iter()
                    .any(|(custom, _)| custom.eq_ignore_ascii_case(name))
            })
            .map(|(name, value)| (name.clone(), header_text(value)))
            .collect();
        headers.extend(self.config.custom_headers.iter().cloned());

        ProviderRequest {
            method: request.method.clone(),
            url: provider_url(&self.config.provider_url, request),
            headers,
            body: request.body.as_ref().map(crate::Expected::to_example),
        }
    }

    fn compare_response(
        &self,
        interaction: &Interaction,
        actual: &ProviderResponse,
        sink: &mut dyn ResultSink,
    ) {
        let expected = &interaction.response;
        if expected.status != actual.status {
            sink.fail(
                &format!("expected status {} but got {}", expected.status, actual.status),
                Some(&Path::root("status")),
            );
        }
        compare_headers(&expected.headers, &actual.headers, &Path::root("headers"), sink);
        if let Some(body) = &expected.body {
            let actual_body = parse_body(&actual.body, sink);
            compare(body, &actual_body, &Path::root("body"), sink);
        }
    }
}

/// `base` with the request's path appended and its query applied.
#[must_use]
pub fn provider_url(base: &Url, request: &Request) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    let path = request.path.trim_start_matches('/');
    url.set_path(&format!("{prefix}/{path}"));
    if request.query.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&request.query_string()));
    }
    url
}

/// Decode a response body: JSON if possible, otherwise its text. An empty
/// body is `null`.
fn parse_body(body: &[u8], sink: &mut dyn ResultSink) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|_| {
        sink.warn("response body is not JSON; comparing as text");
        Value::String(String::from_utf8_lossy(body).into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Response;
    use crate::matcher::MatcherValue;
    use crate::result::CollectingResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        setup_status: Option<u16>,
        response: Option<ProviderResponse>,
        setups: Mutex<Vec<Value>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn setup_state(
            &self,
            _url: &Url,
            _headers: &[(String, String)],
            payload: &Value,
        ) -> Result<u16, PlatformError> {
            self.setups.lock().unwrap().push(payload.clone());
            self.setup_status
                .ok_or_else(|| PlatformError::unavailable("connection refused"))
        }

        async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, PlatformError> {
            self.requests.lock().unwrap().push(request.clone());
            self.response
                .clone()
                .ok_or_else(|| PlatformError::unavailable("connection refused"))
        }
    }

    fn config() -> VerifierConfig {
        VerifierConfig::new("users", Url::parse("http://provider.test/api/").unwrap())
            .with_setup_url(Url::parse("http://provider.test/_setup").unwrap())
            .with_custom_header("Authorization", "Bearer t")
    }

    fn json_response(status: u16, body: &Value) -> ProviderResponse {
        ProviderResponse {
            status,
            headers: vec![("content-type".into(), "application/json".into())],
            body: serde_json::to_vec(body).unwrap(),
        }
    }

    fn get_user() -> Interaction {
        Interaction::new(
            "get user",
            Request::new("GET", "/users/1").with_query("expand", "roles"),
            Response::new(200).with_body(
                MatcherValue::like(serde_json::json!({"id": 1, "name": "alice"})).unwrap(),
            ),
        )
        .given("user 1 exists")
    }

    #[tokio::test]
    async fn test_passing_interaction() {
        let transport = FakeTransport {
            setup_status: Some(200),
            response: Some(json_response(200, &json!({"id": 7, "name": "bob", "extra": true}))),
            ..FakeTransport::default()
        };
        let verifier = Verifier::new(config(), transport);
        let mut sink = CollectingResult::default();

        let outcome = verifier.verify_interaction("web", &get_user(), &mut sink).await;
        assert!(outcome.success, "{:?}", sink.failures);
        assert_eq!(outcome.reached, InteractionPhase::Done);

        let setups = verifier.transport().setups.lock().unwrap();
        assert_eq!(
            setups[0],
            json!({
                "provider": "users",
                "consumer": "web",
                "state": "user 1 exists",
                "states": ["user 1 exists"],
                "params": {},
            })
        );
        let requests = verifier.transport().requests.lock().unwrap();
        assert_eq!(requests[0].url.as_str(), "http://provider.test/api/users/1?expand=roles");
        assert!(requests[0]
            .headers
            .contains(&("Authorization".to_string(), "Bearer t".to_string())));
    }

    #[tokio::test]
    async fn test_setup_failure_skips_request() {
        let transport = FakeTransport {
            setup_status: Some(500),
            response: Some(json_response(200, &json!({}))),
            ..FakeTransport::default()
        };
        let verifier = Verifier::new(config(), transport);
        let mut sink = CollectingResult::default();

        let outcome = verifier.verify_interaction("web", &get_user(), &mut sink).await;
        assert!(!outcome.success);
        assert_eq!(outcome.reached, InteractionPhase::Pending);
        assert!(sink.failures[0].starts_with("Invalid provider state \"user 1 exists\""));
        assert!(verifier.transport().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_attributed_to_request_path() {
        let verifier = Verifier::new(config(), FakeTransport {
            setup_status: Some(200),
            ..FakeTransport::default()
        });
        let mut sink = CollectingResult::default();

        let outcome = verifier.verify_interaction("web", &get_user(), &mut sink).await;
        assert!(!outcome.success);
        assert_eq!(outcome.reached, InteractionPhase::StateSetupDone);
        assert!(sink.failures[0].ends_with("at /users/1"));
    }

    #[tokio::test]
    async fn test_mismatches_accumulate() {
        let transport = FakeTransport {
            setup_status: Some(200),
            response: Some(json_response(404, &json!({"id": "seven"}))),
            ..FakeTransport::default()
        };
        let verifier = Verifier::new(config(), transport);
        let mut sink = CollectingResult::default();

        let outcome = verifier.verify_interaction("web", &get_user(), &mut sink).await;
        assert!(!outcome.success);
        assert_eq!(sink.failures.len(), 3);
        assert_eq!(sink.failures[0], "expected status 200 but got 404 at status");
    }

    #[tokio::test]
    async fn test_contract_success_is_and() {
        let transport = FakeTransport {
            setup_status: Some(200),
            response: Some(json_response(200, &json!({"id": 1, "name": "alice"}))),
            ..FakeTransport::default()
        };
        let verifier = Verifier::new(config(), transport);
        let contract = Contract::new("web", "users")
            .with_interaction(get_user())
            .with_interaction(Interaction::new(
                "delete user",
                Request::new("DELETE", "/users/1"),
                Response::new(204),
            ));
        let mut sink = CollectingResult::default();

        let result = verifier.verify_contract(&contract, &mut sink).await;
        assert!(!result.success);
        assert_eq!(result.failed().collect::<Vec<_>>(), vec!["delete user"]);
        assert!(result.interactions[0].success);
    }

    #[tokio::test]
    async fn test_consumer_filter() {
        let transport = FakeTransport {
            setup_status: Some(200),
            response: Some(json_response(200, &json!({"id": 1, "name": "alice"}))),
            ..FakeTransport::default()
        };
        let verifier = Verifier::new(config().with_consumer("web"), transport);
        let contracts = vec![
            Contract::new("web", "users").with_interaction(get_user()),
            Contract::new("mobile", "users").with_interaction(get_user()),
        ];
        let mut sink = CollectingResult::default();

        let summary = verifier.verify_all(&contracts, &mut sink).await;
        assert!(summary.success);
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].consumer, "web");
    }

    #[test]
    fn test_parse_body() {
        let mut sink = CollectingResult::default();
        assert_eq!(parse_body(b"", &mut sink), Value::Null);
        assert_eq!(parse_body(br#"{"a":1}"#, &mut sink), json!({"a": 1}));
        assert!(sink.warnings.is_empty());
        assert_eq!(parse_body(b"hello", &mut sink), json!("hello"));
        assert_eq!(sink.warnings.len(), 1);
    }

    #[test]
    fn test_provider_url_without_base_path() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let url = provider_url(&base, &Request::new("GET", "/health"));
        assert_eq!(url.as_str(), "http://localhost:8080/health");
    }
}
