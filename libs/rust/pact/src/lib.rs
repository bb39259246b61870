//! Provider verification for consumer-driven contracts.
//!
//! Consumers describe the requests they send and the responses they rely on,
//! using [`MatcherValue`]s wherever a literal would be too strict. This crate
//! replays those interactions against a running provider and reports every
//! divergence, path by path, through a [`ResultSink`].
//!
//! # Example
//!
//! ```
//! use pact_verifier::{Expected, MatcherValue, Path, compare};
//! use pact_verifier::result::LoggedResult;
//! use pact_verifier::ResultSink;
//! use serde_json::json;
//!
//! let expected: Expected = MatcherValue::like(json!({"id": 1, "name": "alice"}))
//!     .unwrap()
//!     .into();
//! let mut sink = LoggedResult::default();
//! compare(&expected, &json!({"id": 7, "name": "bob"}), &Path::root("body"), &mut sink);
//! assert!(sink.success());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compare;
pub mod config;
pub mod contract;
pub mod error;
pub mod expected;
pub mod header;
pub mod matcher;
pub mod path;
pub mod result;
pub mod rules;
pub mod transport;
pub mod verification;
pub mod verifier;

pub use compare::{compare, compare_headers};
pub use config::{ConfigError, VerifierConfig};
pub use contract::{
    Contract, ContractMetadata, Interaction, PactSpecification, Participant, ProviderState, Request,
    Response,
};
pub use error::MatcherError;
pub use expected::{Expected, IntoExample};
pub use header::{Part, get_header_param, parse_header};
pub use matcher::MatcherValue;
pub use path::{Path, PathSegment, format_path};
pub use result::{AssertResult, CaptureResult, LoggedResult, ResultSink};
pub use rules::{
    GeneratedRule, RuleDescriptor, RuleTable, RuleVersion, generate_matching_rule_v2,
    generate_matching_rule_v3,
};
pub use transport::{HttpTransport, ProviderRequest, ProviderResponse, Transport};
pub use verification::{InteractionOutcome, InteractionPhase, VerificationResult, VerificationSummary};
pub use verifier::Verifier;
