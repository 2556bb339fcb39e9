//! HTTP client layer
//!
//! Request and response values, the `Transport` trait checks send through,
//! and `HttpTransport`, the reqwest-backed implementation used outside tests.

mod http;
mod transport;
mod types;

pub use http::{HttpTransport, USER_AGENT};
pub use transport::{Transport, TransportError, TransportResult};
pub use types::{ApiRequest, ApiResponse, RequestError};
