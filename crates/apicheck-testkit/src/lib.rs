//! Apicheck Test Kit
//!
//! Test infrastructure for exercising checks without a network.
//!
//! This crate provides:
//! - A fake `Transport` that replays canned replies and records requests
//! - Builders for canned JSON and text responses
//!
//! # Example
//!
//! ```rust
//! use apicheck_testkit::{FakeTransport, json_response, users_page};
//!
//! let transport = FakeTransport::new().with_response(json_response(200, users_page(2)));
//! ```

pub mod fake;
pub mod responses;

pub use fake::{FakeTransport, Reply};
pub use responses::{json_response, text_response, users_page};
