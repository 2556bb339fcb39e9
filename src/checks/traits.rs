//! Check result and supporting types
//!
//! A check run always produces a `CheckResult`. Failures carry a
//! `FailureKind` so a harness can tell transport trouble apart from a
//! response that simply did not match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use super::expectation::Mismatch;
use crate::client::TransportError;

/// Timeout applied when neither the check nor the config sets one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that end a check run
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Parse error: response body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expectation failure: {0}")]
    Expectation(#[from] Mismatch),

    #[error("Cancelled before a response was received")]
    Cancelled,
}

impl CheckError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            CheckError::Transport(_) => FailureKind::Transport,
            CheckError::Parse(_) => FailureKind::Parse,
            CheckError::Expectation(_) => FailureKind::Expectation,
            CheckError::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Why a check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The HTTP exchange did not complete
    Transport,
    /// The body was not JSON but a field was asserted
    Parse,
    /// The response did not match the expectation
    Expectation,
    /// The run was aborted before completing
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::Expectation => write!(f, "expectation"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of a single check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check
    pub check_name: String,
    /// Whether the check passed
    pub passed: bool,
    /// How long the run took
    pub duration: Duration,
    /// Summary on success, diagnostic on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure classification, `None` when passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl CheckResult {
    /// Create a passing result
    pub fn passed(check_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            check_name: check_name.into(),
            passed: true,
            duration,
            message: None,
            failure: None,
        }
    }

    /// Create a failing result from the error that ended the run
    pub fn failed(check_name: impl Into<String>, error: &CheckError, duration: Duration) -> Self {
        Self {
            check_name: check_name.into(),
            passed: false,
            duration,
            message: Some(error.to_string()),
            failure: Some(error.kind()),
        }
    }

    /// Add a summary message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Options for a check run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Maximum time to wait for the response
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

impl CheckOptions {
    /// Options with an explicit timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Get the timeout or a default value
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_carries_kind_and_message() {
        let err = CheckError::Transport(TransportError::Timeout(Duration::from_secs(1)));
        let result = CheckResult::failed("users", &err, Duration::from_millis(5));

        assert!(!result.passed);
        assert_eq!(result.failure, Some(FailureKind::Transport));
        assert_eq!(
            result.message.as_deref(),
            Some("Transport error: Request timed out after 1s")
        );
    }

    #[test]
    fn test_passed_result() {
        let result = CheckResult::passed("users", Duration::ZERO).with_message("ok");
        assert!(result.passed);
        assert_eq!(result.failure, None);
        assert_eq!(result.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_result_serialization_skips_empty_fields() {
        let result = CheckResult::passed("users", Duration::from_secs(1));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["check_name"], "users");
        assert!(json.get("failure").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Transport.to_string(), "transport");
        assert_eq!(FailureKind::Parse.to_string(), "parse");
        assert_eq!(FailureKind::Expectation.to_string(), "expectation");
        assert_eq!(FailureKind::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_timeout_or() {
        assert_eq!(CheckOptions::default().timeout_or(DEFAULT_TIMEOUT), DEFAULT_TIMEOUT);
        let opts = CheckOptions::with_timeout(Duration::from_millis(250));
        assert_eq!(opts.timeout_or(DEFAULT_TIMEOUT), Duration::from_millis(250));
    }
}
