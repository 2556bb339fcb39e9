//! Fake transport for unit testing
//!
//! Answers requests from a queue of canned replies instead of the network,
//! and records every request it sees.
//!
//! # Example
//!
//! ```rust
//! use apicheck::client::{ApiRequest, Transport, TransportError};
//! use apicheck_testkit::fake::FakeTransport;
//! use apicheck_testkit::responses::json_response;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = FakeTransport::new()
//!     .with_response(json_response(200, json!({"page": 2})))
//!     .with_error(TransportError::Connect("refused".into()));
//!
//! let request = ApiRequest::get("https://example.test/api/users").unwrap();
//! assert_eq!(transport.send(&request).await.unwrap().status(), 200);
//! assert!(transport.send(&request).await.is_err());
//! assert_eq!(transport.request_count().await, 2);
//! # }
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

use apicheck::client::{ApiRequest, ApiResponse, Transport, TransportError, TransportResult};

/// A canned reply
#[derive(Debug, Clone)]
pub enum Reply {
    Response(ApiResponse),
    Error(TransportError),
}

/// Transport that replays canned replies
///
/// Replies are consumed in order. The last reply is never consumed, so a
/// transport with a single reply answers every request the same way.
#[derive(Debug, Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Reply>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    /// Create a fake transport with no replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn with_response(self, response: ApiResponse) -> Self {
        self.with_reply(Reply::Response(response))
    }

    /// Queue a transport error
    pub fn with_error(self, error: TransportError) -> Self {
        self.with_reply(Reply::Error(error))
    }

    /// Queue a reply
    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.replies.get_mut().push_back(reply);
        self
    }

    /// Wait this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests received so far
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> TransportResult<ApiResponse> {
        self.requests.lock().await.push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = {
            let mut replies = self.replies.lock().await;
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(error)) => Err(error),
            None => Err(TransportError::Request(format!(
                "no canned reply for {request}"
            ))),
        }
    }
}
