//! Verification outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How far an interaction progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPhase {
    /// Nothing done yet
    Pending,
    /// Provider states are in place
    StateSetupDone,
    /// The provider answered the replayed request
    RequestSent,
    /// Status, headers and body were compared
    Compared,
    /// The sink was ended
    Done,
}

/// Outcome of one interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionOutcome {
    /// Interaction description
    pub description: String,
    /// Whether the sink recorded no failure
    pub success: bool,
    /// Last phase reached before the sink was ended
    pub reached: InteractionPhase,
}

/// Verification result for one contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether every interaction passed
    pub success: bool,
    /// Provider name
    pub provider: String,
    /// Consumer name
    pub consumer: String,
    /// Per-interaction outcomes, in contract order
    pub interactions: Vec<InteractionOutcome>,
    /// Verification timestamp
    pub verified_at: DateTime<Utc>,
}

impl VerificationResult {
    /// Summarize `interactions`; success is their logical AND.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        consumer: impl Into<String>,
        interactions: Vec<InteractionOutcome>,
    ) -> Self {
        Self {
            success: interactions.iter().all(|i| i.success),
            provider: provider.into(),
            consumer: consumer.into(),
            interactions,
            verified_at: Utc::now(),
        }
    }

    /// Descriptions of failed interactions.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.interactions
            .iter()
            .filter(|i| !i.success)
            .map(|i| i.description.as_str())
    }
}

/// Results for every contract of a provider run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    /// Whether every verified contract passed
    pub success: bool,
    /// Human readable verdict
    pub reason: String,
    /// Per-contract results
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    /// Summarize contract results.
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let success = results.iter().all(|r| r.success);
        let reason = if success {
            format!("{} contract(s) verified", results.len())
        } else {
            let failed: Vec<_> = results
                .iter()
                .filter(|r| !r.success)
                .map(|r| format!("{} -> {}", r.consumer, r.provider))
                .collect();
            format!("Verification failed: {}", failed.join(", "))
        };

        Self {
            success,
            reason,
            results,
        }
    }

    /// Process exit code: 0 on success, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(description: &str, success: bool) -> InteractionOutcome {
        InteractionOutcome {
            description: description.to_string(),
            success,
            reached: InteractionPhase::Compared,
        }
    }

    #[test]
    fn test_result_is_and_of_outcomes() {
        let passed = VerificationResult::new("users", "web", vec![outcome("a", true), outcome("b", true)]);
        assert!(passed.success);
        assert_eq!(passed.failed().count(), 0);

        let failed = VerificationResult::new("users", "web", vec![outcome("a", true), outcome("b", false)]);
        assert!(!failed.success);
        assert_eq!(failed.failed().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_empty_contract_passes() {
        assert!(VerificationResult::new("users", "web", Vec::new()).success);
    }

    #[test]
    fn test_summary() {
        let ok = VerificationResult::new("users", "web", vec![outcome("a", true)]);
        let bad = VerificationResult::new("users", "mobile", vec![outcome("b", false)]);

        let summary = VerificationSummary::from_results(vec![ok.clone()]);
        assert!(summary.success);
        assert_eq!(summary.exit_code(), 0);

        let summary = VerificationSummary::from_results(vec![ok, bad]);
        assert!(!summary.success);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.reason, "Verification failed: mobile -> users");
    }

    #[test]
    fn test_result_serialization() {
        let result = VerificationResult::new("users", "web", vec![outcome("a", true)]);
        let json = serde_json::to_string(&result).unwrap();
        let restored: VerificationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, restored);
    }
}
