//! Apicheck - REST API assertion checks
//!
//! Issues a GET request against an HTTP endpoint and asserts on the response
//! status code and on a single field of the JSON body.
//!
//! ## Architecture
//!
//! - A check is one request plus one [`Expectation`](checks::Expectation),
//!   evaluated exactly once per run
//! - The HTTP exchange goes through the [`Transport`](client::Transport) trait,
//!   so checks can be exercised against a fake transport in tests
//! - Failures are classified as transport, parse or expectation errors
//!
//! ## Modules
//!
//! - [`client`] - Request/response types, the `Transport` seam and its reqwest implementation
//! - [`checks`] - Expectations, field paths and the `ApiCheck` runner
//! - [`config`] - YAML configuration of named checks

pub mod checks;
pub mod client;
pub mod config;
