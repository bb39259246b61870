//! Transport error types shared by the verifier and its HTTP adapter.
//!
//! Every error is classified as retryable or not so that provider state
//! setup calls can be retried without retrying genuine misconfiguration.

use thiserror::Error;

/// Error raised while talking to a provider or its state setup endpoint.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Provider is not reachable or answered with a transient status
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Invalid input provided (bad URL, bad header)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout occurred
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Check if this error is retryable.
    ///
    /// Connection failures, timeouts and temporary unavailability are
    /// retryable; malformed input and serialization failures are not.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// let err = PlatformError::unavailable("connection refused");
    /// assert!(err.is_retryable());
    ///
    /// let err = PlatformError::invalid_input("bad header");
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::Unavailable(_) | Self::Timeout(_) => true,
            Self::Serialization(_) | Self::InvalidInput(_) | Self::Internal(_) => false,
        }
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a timeout error with the given message.
    #[must_use]
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PlatformError::unavailable("test").is_retryable());
        assert!(PlatformError::timeout("test").is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!PlatformError::invalid_input("test").is_retryable());
        assert!(!PlatformError::Internal("test".to_string()).is_retryable());

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!PlatformError::from(json_err).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::unavailable("provider down");
        assert_eq!(err.to_string(), "Service unavailable: provider down");

        let err = PlatformError::timeout("state setup");
        assert_eq!(err.to_string(), "Operation timed out: state setup");
    }
}
