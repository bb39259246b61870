//! Pact contract types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::MatcherError;
use crate::expected::Expected;
use crate::rules::{
    RuleTable, RuleVersion, generate_matching_rule_v2, generate_matching_rule_v3, rule_table_json,
    v2_key,
};

/// A Pact contract between consumer and provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    /// Consumer participant
    pub consumer: Participant,
    /// Provider participant
    pub provider: Participant,
    /// Contract interactions
    pub interactions: Vec<Interaction>,
    /// Contract metadata
    pub metadata: ContractMetadata,
}

impl Contract {
    /// Create an empty contract between `consumer` and `provider`.
    #[must_use]
    pub fn new(consumer: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            consumer: Participant::new(consumer),
            provider: Participant::new(provider),
            interactions: Vec::new(),
            metadata: ContractMetadata::default(),
        }
    }

    /// Add an interaction.
    #[must_use]
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interactions.push(interaction);
        self
    }

    /// Set the pact specification version.
    #[must_use]
    pub fn with_specification(mut self, version: impl Into<String>) -> Self {
        self.metadata.pact_specification.version = version.into();
        self
    }

    /// Matching rule encoding implied by the specification version.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::UnknownSpecification`] for versions with no
    /// known encoding.
    pub fn rule_version(&self) -> Result<RuleVersion, MatcherError> {
        self.metadata.pact_specification.version.parse()
    }

    /// Render the contract as a pact document.
    ///
    /// # Errors
    ///
    /// Fails if the specification version is unknown or an interaction holds
    /// a matcher its encoding cannot express.
    pub fn to_pact_json(&self) -> Result<Value, MatcherError> {
        let version = self.rule_version()?;
        let interactions = self
            .interactions
            .iter()
            .map(|i| i.to_pact_json(version))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({
            "consumer": self.consumer,
            "provider": self.provider,
            "interactions": interactions,
            "metadata": self.metadata,
        }))
    }
}

/// A participant in a contract (consumer or provider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Participant name
    pub name: String,
}

impl Participant {
    /// Create a new participant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A named precondition the provider must reach before an interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderState {
    /// State name
    pub name: String,
    /// State parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl ProviderState {
    /// Create a state without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// An interaction in a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    /// Interaction description
    pub description: String,
    /// Provider states (preconditions)
    pub provider_states: Vec<ProviderState>,
    /// Expected request
    pub request: Request,
    /// Expected response
    pub response: Response,
}

impl Interaction {
    /// Create an interaction without provider states.
    #[must_use]
    pub fn new(description: impl Into<String>, request: Request, response: Response) -> Self {
        Self {
            description: description.into(),
            provider_states: Vec::new(),
            request,
            response,
        }
    }

    /// Add a provider state.
    #[must_use]
    pub fn given(mut self, state: impl Into<String>) -> Self {
        self.provider_states.push(ProviderState::new(state));
        self
    }

    /// Add a provider state with parameters.
    #[must_use]
    pub fn given_with_params(mut self, state: ProviderState) -> Self {
        self.provider_states.push(state);
        self
    }

    /// Render this interaction for a pact document.
    ///
    /// V2 documents carry plain examples plus a `matchingRules` table; V3
    /// documents carry matchers inline.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::NotAllowed`] if a matcher cannot be expressed
    /// in `version`.
    pub fn to_pact_json(&self, version: RuleVersion) -> Result<Value, MatcherError> {
        let mut doc = Map::new();
        doc.insert("description".into(), Value::String(self.description.clone()));
        match version {
            RuleVersion::V2 => {
                if let Some(state) = self.provider_states.first() {
                    doc.insert("providerState".into(), Value::String(state.name.clone()));
                }
            }
            RuleVersion::V3 => {
                if !self.provider_states.is_empty() {
                    doc.insert("providerStates".into(), json!(self.provider_states));
                }
            }
        }

        let mut request = Map::new();
        request.insert("method".into(), Value::String(self.request.method.clone()));
        request.insert("path".into(), Value::String(self.request.path.clone()));
        if !self.request.query.is_empty() {
            let query = match version {
                RuleVersion::V2 => Value::String(self.request.query_string()),
                RuleVersion::V3 => json!(self.request.query),
            };
            request.insert("query".into(), query);
        }
        render_message(
            &mut request,
            &self.request.headers,
            self.request.body.as_ref(),
            version,
        )?;

        let mut response = Map::new();
        response.insert("status".into(), Value::from(self.response.status));
        render_message(
            &mut response,
            &self.response.headers,
            self.response.body.as_ref(),
            version,
        )?;

        doc.insert("request".into(), Value::Object(request));
        doc.insert("response".into(), Value::Object(response));
        Ok(Value::Object(doc))
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.description)?;
        if !self.provider_states.is_empty() {
            let names: Vec<&str> = self.provider_states.iter().map(|s| s.name.as_str()).collect();
            write!(f, " given {}", names.join(" and "))?;
        }
        Ok(())
    }
}

/// Headers and body of a request or response, in the version's encoding.
fn render_message(
    out: &mut Map<String, Value>,
    headers: &BTreeMap<String, Expected>,
    body: Option<&Expected>,
    version: RuleVersion,
) -> Result<(), MatcherError> {
    match version {
        RuleVersion::V2 => {
            let mut rules = RuleTable::new();
            if !headers.is_empty() {
                let mut rendered = Map::new();
                for (name, value) in headers {
                    rendered.insert(name.clone(), Value::String(header_text(value)));
                    rules.extend(generate_matching_rule_v2(value, &v2_key("$.headers", name))?);
                }
                out.insert("headers".into(), Value::Object(rendered));
            }
            if let Some(body) = body {
                out.insert("body".into(), body.to_example());
                rules.extend(generate_matching_rule_v2(body, "$.body")?);
            }
            if !rules.is_empty() {
                out.insert("matchingRules".into(), rule_table_json(&rules));
            }
        }
        RuleVersion::V3 => {
            if !headers.is_empty() {
                let rendered = headers
                    .iter()
                    .map(|(name, value)| (name.clone(), generate_matching_rule_v3(value)))
                    .collect();
                out.insert("headers".into(), Value::Object(rendered));
            }
            if let Some(body) = body {
                out.insert("body".into(), generate_matching_rule_v3(body));
            }
        }
    }
    Ok(())
}

/// Example header value as sent on the wire.
#[must_use]
pub fn header_text(value: &Expected) -> String {
    match value.to_example() {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// HTTP request in an interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Query parameters
    pub query: BTreeMap<String, Vec<String>>,
    /// Request headers
    pub headers: BTreeMap<String, Expected>,
    /// Request body
    pub body: Option<Expected>,
}

impl Request {
    /// Create a request without headers, query or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Append a query parameter value.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Set a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Expected>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Expected>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// URL-encoded query string, keys in order.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.query {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// HTTP response in an interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: BTreeMap<String, Expected>,
    /// Response body
    pub body: Option<Expected>,
}

impl Response {
    /// Create a response without headers or body.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Set a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Expected>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Expected>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Contract metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractMetadata {
    /// Pact specification version
    #[serde(rename = "pactSpecification")]
    pub pact_specification: PactSpecification,
}

/// Pact specification version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PactSpecification {
    /// Version string
    pub version: String,
}

impl Default for ContractMetadata {
    fn default() -> Self {
        Self {
            pact_specification: PactSpecification {
                version: "3.0.0".to_string(),
            },
        }
    }
}
