//! Verifier configuration.
//!
//! Built either programmatically or from `PACT_*` environment variables
//! (a `.env` file is honoured).

use rust_common::{HttpConfig, RetryConfig, TracingConfig};
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;
use url::Url;

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable not set
    #[error("missing required setting {0}")]
    Missing(String),

    /// URL failed to parse
    #[error("invalid URL in {name}: {reason}")]
    InvalidUrl {
        /// Setting name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Custom header not of the form `Name: value`
    #[error("invalid custom provider header {0:?}: expected \"Name: value\"")]
    InvalidHeader(String),

    /// Any other malformed value
    #[error("invalid {name}: {reason}")]
    InvalidValue {
        /// Setting name
        name: String,
        /// What was wrong
        reason: String,
    },
}

/// Provider verification settings.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Name of the provider being verified
    pub provider_name: String,
    /// Base URL of the provider
    pub provider_url: Url,
    /// Provider state setup endpoint
    pub provider_setup_url: Option<Url>,
    /// Only verify contracts from this consumer
    pub consumer: Option<String>,
    /// Headers added to state setup and interaction requests
    pub custom_headers: Vec<(String, String)>,
    /// Result sink threshold
    pub log_level: Level,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Retry settings for state setup
    pub retry: RetryConfig,
}

impl VerifierConfig {
    /// Settings for `provider_name` served at `provider_url`.
    #[must_use]
    pub fn new(provider_name: impl Into<String>, provider_url: Url) -> Self {
        Self {
            provider_name: provider_name.into(),
            provider_url,
            provider_setup_url: None,
            consumer: None,
            custom_headers: Vec::new(),
            log_level: Level::INFO,
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Set the state setup endpoint.
    #[must_use]
    pub fn with_setup_url(mut self, url: Url) -> Self {
        self.provider_setup_url = Some(url);
        self
    }

    /// Only verify contracts from `consumer`.
    #[must_use]
    pub fn with_consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumer = Some(consumer.into());
        self
    }

    /// Add a custom provider header.
    #[must_use]
    pub fn with_custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Set the result sink threshold.
    #[must_use]
    pub const fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Replace HTTP client settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Replace retry settings.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Tracing settings matching the configured threshold.
    #[must_use]
    pub fn tracing(&self) -> TracingConfig {
        TracingConfig::default().with_log_level(self.log_level)
    }

    /// Whether contracts from `consumer` should be verified.
    #[must_use]
    pub fn accepts_consumer(&self, consumer: &str) -> bool {
        self.consumer.as_deref().is_none_or(|c| c == consumer)
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `PACT_PROVIDER_NAME` | provider name (required) |
    /// | `PACT_PROVIDER_URL` | provider base URL (required) |
    /// | `PACT_PROVIDER_SETUP_URL` | state setup endpoint |
    /// | `PACT_CONSUMER` | consumer filter |
    /// | `PACT_CUSTOM_PROVIDER_HEADERS` | `Name: value` list, see [`split_custom_headers`] |
    /// | `PACT_LOG_LEVEL` | `quiet`, `info` or `verbose` |
    /// | `PACT_REQUEST_TIMEOUT` | request timeout in seconds |
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`VerifierConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider_name =
            var("PACT_PROVIDER_NAME").ok_or_else(|| ConfigError::Missing("PACT_PROVIDER_NAME".into()))?;
        let provider_url = parse_url(
            "PACT_PROVIDER_URL",
            &var("PACT_PROVIDER_URL").ok_or_else(|| ConfigError::Missing("PACT_PROVIDER_URL".into()))?,
        )?;

        let mut config = Self::new(provider_name, provider_url);

        if let Some(setup) = var("PACT_PROVIDER_SETUP_URL") {
            config.provider_setup_url = Some(parse_url("PACT_PROVIDER_SETUP_URL", &setup)?);
        }
        config.consumer = var("PACT_CONSUMER");
        if let Some(headers) = var("PACT_CUSTOM_PROVIDER_HEADERS") {
            config.custom_headers = split_custom_headers(&headers)
                .into_iter()
                .map(parse_custom_header)
                .collect::<Result<_, _>>()?;
        }
        if let Some(level) = var("PACT_LOG_LEVEL") {
            config.log_level = parse_log_level(&level)?;
        }
        if let Some(timeout) = var("PACT_REQUEST_TIMEOUT") {
            let secs: u64 = timeout.trim().parse().map_err(|e| ConfigError::InvalidValue {
                name: "PACT_REQUEST_TIMEOUT".into(),
                reason: format!("{e}"),
            })?;
            config.http = config.http.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Split a header list into individual `Name: value` entries.
///
/// Entries are separated by newlines, or by a comma directly followed by the
/// next `Name:`. Commas inside a value (`Accept: text/html, application/json`)
/// stay with that value.
#[must_use]
pub fn split_custom_headers(list: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    for line in list.lines() {
        let mut start = 0;
        for (at, _) in line.match_indices(',') {
            if starts_with_header_name(&line[at + 1..]) {
                entries.push(&line[start..at]);
                start = at + 1;
            }
        }
        entries.push(&line[start..]);
    }
    entries.retain(|e| !e.trim().is_empty());
    entries
}

fn starts_with_header_name(rest: &str) -> bool {
    let rest = rest.trim_start();
    let name_len = rest
        .find(|c: char| !is_token_char(c))
        .unwrap_or(rest.len());
    name_len > 0 && rest[name_len..].trim_start().starts_with(':')
}

const fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

/// Parse a `Name: value` header.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidHeader`] if there is no colon or the name is
/// empty.
pub fn parse_custom_header(header: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(header.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidHeader(header.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Map a verbosity setting to a sink threshold.
///
/// `quiet`, `info` and `verbose` map to WARN, INFO and DEBUG; tracing level
/// names are accepted as well.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for anything else.
pub fn parse_log_level(value: &str) -> Result<Level, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "quiet" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "verbose" => Ok(Level::DEBUG),
        other => other.parse().map_err(|_| ConfigError::InvalidValue {
            name: "PACT_LOG_LEVEL".into(),
            reason: format!("unknown level {value:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_minimal_config() {
        let config = VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "users"),
            ("PACT_PROVIDER_URL", "http://localhost:8080"),
        ]))
        .unwrap();

        assert_eq!(config.provider_name, "users");
        assert_eq!(config.provider_url.as_str(), "http://localhost:8080/");
        assert!(config.provider_setup_url.is_none());
        assert!(config.custom_headers.is_empty());
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.accepts_consumer("anyone"));
    }

    #[test]
    fn test_full_config() {
        let config = VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "users"),
            ("PACT_PROVIDER_URL", "http://localhost:8080"),
            ("PACT_PROVIDER_SETUP_URL", "http://localhost:8080/_setup"),
            ("PACT_CONSUMER", "web"),
            (
                "PACT_CUSTOM_PROVIDER_HEADERS",
                "Authorization: Basic cGFjdDpwYWN0, X-Env:test",
            ),
            ("PACT_LOG_LEVEL", "verbose"),
            ("PACT_REQUEST_TIMEOUT", "5"),
        ]))
        .unwrap();

        assert_eq!(
            config.provider_setup_url.clone().map(String::from).as_deref(),
            Some("http://localhost:8080/_setup")
        );
        assert!(config.accepts_consumer("web"));
        assert!(!config.accepts_consumer("mobile"));
        assert_eq!(
            config.custom_headers,
            vec![
                ("Authorization".to_string(), "Basic cGFjdDpwYWN0".to_string()),
                ("X-Env".to_string(), "test".to_string()),
            ]
        );
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.http.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_provider() {
        let err = VerifierConfig::from_lookup(lookup(&[("PACT_PROVIDER_URL", "http://x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("PACT_PROVIDER_NAME".into()));
    }

    #[test]
    fn test_invalid_url() {
        let err = VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "users"),
            ("PACT_PROVIDER_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_custom_header_parsing() {
        assert_eq!(
            parse_custom_header("X-Token:  abc ").unwrap(),
            ("X-Token".to_string(), "abc".to_string())
        );
        assert!(parse_custom_header("no colon").is_err());
        assert!(parse_custom_header(": value").is_err());
    }

    #[test]
    fn test_custom_header_values_keep_commas() {
        let config = VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "users"),
            ("PACT_PROVIDER_URL", "http://localhost:8080"),
            (
                "PACT_CUSTOM_PROVIDER_HEADERS",
                "Accept: text/html, application/json, Cache-Control: no-cache, max-age=0",
            ),
        ]))
        .unwrap();

        assert_eq!(
            config.custom_headers,
            vec![
                ("Accept".to_string(), "text/html, application/json".to_string()),
                ("Cache-Control".to_string(), "no-cache, max-age=0".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_custom_headers() {
        assert_eq!(
            split_custom_headers("Accept: text/html, application/json"),
            vec!["Accept: text/html, application/json"]
        );
        assert_eq!(
            split_custom_headers("X-A: 1\nX-B: 2, 3\n"),
            vec!["X-A: 1", "X-B: 2, 3"]
        );
        assert_eq!(split_custom_headers("X-A: 1,X-B :2"), vec!["X-A: 1", "X-B :2"]);
        assert!(split_custom_headers("\n  \n").is_empty());
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(parse_log_level("quiet").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("verbose").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert!(parse_log_level("loud").is_err());
    }
}
