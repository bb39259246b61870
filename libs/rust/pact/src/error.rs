//! Matcher error types.
//!
//! These are authoring errors: a contract built from values a matcher cannot
//! hold, or serialized for a rule version that cannot express it. Mismatches
//! between consumer and provider never surface here; they go through a
//! [`ResultSink`](crate::ResultSink).

use thiserror::Error;

use crate::rules::RuleVersion;

/// Kinds a matcher example may be built from.
pub const ALLOWED_KINDS: &str = "null, boolean, integer, float, string, sequence, mapping";

/// Errors raised while building or serializing matchers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    /// Example value is outside the allow-list
    #[error("unsupported matcher value type {kind}: matcher must be one of {}", ALLOWED_KINDS)]
    UnsupportedValue {
        /// Description of the rejected value
        kind: String,
    },

    /// Regex pattern failed to compile
    #[error("invalid regex pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Matcher cannot be expressed in the requested rule version
    #[error("{matcher} matcher is not allowed in {version} matching rules")]
    NotAllowed {
        /// Matcher kind
        matcher: &'static str,
        /// Requested rule version
        version: RuleVersion,
    },

    /// Pact specification version with no known rule encoding
    #[error("unknown pact specification version {0:?}")]
    UnknownSpecification(String),
}

impl MatcherError {
    /// Create an unsupported value error.
    #[must_use]
    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::UnsupportedValue { kind: kind.into() }
    }
}
