//! API Check
//!
//! Sends one GET request and evaluates the response against an expectation.
//!
//! ## What it checks
//!
//! 1. The exchange completes within the timeout (otherwise: transport error)
//! 2. The status code equals the expected one
//! 3. If a field is expected, the body parses as JSON (otherwise: parse error)
//!    and the field equals the expected value
//!
//! Nothing is retried. Every run sends exactly one request.

use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::expectation::Expectation;
use super::traits::{CheckError, CheckOptions, CheckResult, DEFAULT_TIMEOUT};
use crate::client::{ApiRequest, ApiResponse, Transport, TransportError};

/// A named request/expectation pair
#[derive(Debug, Clone)]
pub struct ApiCheck {
    name: String,
    request: ApiRequest,
    expectation: Expectation,
}

impl ApiCheck {
    /// Create a check
    pub fn new(name: impl Into<String>, request: ApiRequest, expectation: Expectation) -> Self {
        Self {
            name: name.into(),
            request,
            expectation,
        }
    }

    /// Check name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The request this check sends
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// The expectation the response is held to
    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Run the check once
    pub async fn run<T>(&self, transport: &T, opts: &CheckOptions) -> CheckResult
    where
        T: Transport + ?Sized,
    {
        self.run_until(transport, opts, std::future::pending::<()>()).await
    }

    /// Run the check once, aborting if `cancel` completes first
    ///
    /// On cancellation the in-flight request is dropped and the result is a
    /// failure of kind `Cancelled`.
    pub async fn run_until<T, F>(
        &self,
        transport: &T,
        opts: &CheckOptions,
        cancel: F,
    ) -> CheckResult
    where
        T: Transport + ?Sized,
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let timeout = opts.timeout_or(DEFAULT_TIMEOUT);

        info!(
            check = %self.name,
            request = %self.request,
            expect = %self.expectation,
            timeout_ms = timeout.as_millis(),
            "Starting check"
        );

        let outcome = tokio::select! {
            outcome = self.execute(transport, timeout) => outcome,
            _ = cancel => Err(CheckError::Cancelled),
        };

        let duration = start.elapsed();

        match outcome {
            Ok(()) => {
                info!(
                    check = %self.name,
                    duration_ms = duration.as_millis(),
                    "Check PASSED"
                );
                CheckResult::passed(&self.name, duration)
                    .with_message(format!("{} matched", self.expectation))
            }
            Err(e) => {
                warn!(
                    check = %self.name,
                    kind = %e.kind(),
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Check FAILED"
                );
                CheckResult::failed(&self.name, &e, duration)
            }
        }
    }

    async fn execute<T>(&self, transport: &T, timeout: Duration) -> Result<(), CheckError>
    where
        T: Transport + ?Sized,
    {
        // Timeouts always report this check's limit, whichever timer fired
        let response = match tokio::time::timeout(timeout, transport.send(&self.request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(TransportError::Timeout(_))) | Err(_) => {
                return Err(TransportError::Timeout(timeout).into());
            }
            Ok(Err(e)) => return Err(e.into()),
        };

        log_response(&self.name, &response);

        self.expectation.evaluate(&response)
    }
}

/// Log the full response at debug level
fn log_response(check: &str, response: &ApiResponse) {
    debug!(
        check = %check,
        status = response.status(),
        headers = ?response.headers(),
        body = %response.body_text(),
        "Response"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::FailureKind;
    use crate::client::TransportResult;
    use async_trait::async_trait;

    /// Transport that answers every request with the same response
    struct StaticTransport(ApiResponse);

    #[async_trait]
    impl Transport for StaticTransport {
        async fn send(&self, _request: &ApiRequest) -> TransportResult<ApiResponse> {
            Ok(self.0.clone())
        }
    }

    /// Transport that never answers
    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn send(&self, _request: &ApiRequest) -> TransportResult<ApiResponse> {
            std::future::pending().await
        }
    }

    fn users_check() -> ApiCheck {
        let request = ApiRequest::get("https://example.test/api/users")
            .unwrap()
            .with_query("page", "2");
        let expectation = Expectation::status(200)
            .unwrap()
            .with_field("page", 2)
            .unwrap();
        ApiCheck::new("users", request, expectation)
    }

    #[tokio::test]
    async fn test_passes_on_matching_response() {
        let transport = StaticTransport(ApiResponse::new(200, r#"{"page":2,"data":[]}"#));
        let result = users_check().run(&transport, &CheckOptions::default()).await;

        assert!(result.passed, "{result:?}");
        assert_eq!(result.check_name, "users");
        assert_eq!(result.message.as_deref(), Some("status 200, page == 2 matched"));
    }

    #[tokio::test]
    async fn test_fails_on_status_mismatch() {
        let transport = StaticTransport(ApiResponse::new(404, "{}"));
        let result = users_check().run(&transport, &CheckOptions::default()).await;

        assert!(!result.passed);
        assert_eq!(result.failure, Some(FailureKind::Expectation));
        assert!(result.message.unwrap().contains("expected 200, got 404"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_transport_error() {
        let opts = CheckOptions::with_timeout(Duration::from_millis(500));
        let result = users_check().run(&StalledTransport, &opts).await;

        assert!(!result.passed);
        assert_eq!(result.failure, Some(FailureKind::Transport));
        assert!(result.message.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_transport_timeout_reports_check_timeout() {
        struct TimedOutTransport;

        #[async_trait]
        impl Transport for TimedOutTransport {
            async fn send(&self, _request: &ApiRequest) -> TransportResult<ApiResponse> {
                Err(TransportError::Timeout(Duration::from_secs(60)))
            }
        }

        let opts = CheckOptions::with_timeout(Duration::from_secs(2));
        let result = users_check().run(&TimedOutTransport, &opts).await;

        assert_eq!(result.failure, Some(FailureKind::Transport));
        assert_eq!(
            result.message.as_deref(),
            Some("Transport error: Request timed out after 2s")
        );
    }

    #[tokio::test]
    async fn test_cancel_aborts_request() {
        let result = users_check()
            .run_until(&StalledTransport, &CheckOptions::default(), async {})
            .await;

        assert!(!result.passed);
        assert_eq!(result.failure, Some(FailureKind::Cancelled));
    }
}
