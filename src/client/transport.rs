//! Transport seam
//!
//! Checks never talk to reqwest directly. They send through a `Transport`,
//! which is `HttpTransport` in production and a fake in tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::types::{ApiRequest, ApiResponse};

/// Failure to complete the HTTP exchange at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Sends a request and returns the response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> TransportResult<ApiResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &ApiRequest) -> TransportResult<ApiResponse> {
        (**self).send(request).await
    }
}
