//! Checks
//!
//! An [`ApiCheck`] pairs one [`ApiRequest`](crate::client::ApiRequest) with
//! one [`Expectation`] and turns a run into a [`CheckResult`].
//!
//! ## Failure kinds
//!
//! - **Transport**: the request did not complete (connect, DNS, timeout)
//! - **Parse**: a field was expected but the body is not JSON
//! - **Expectation**: status or field value differs, or the field is absent
//! - **Cancelled**: the run was aborted by the caller

mod api;
mod expectation;
mod traits;

pub use api::ApiCheck;
pub use expectation::{Expectation, ExpectationError, FieldExpectation, FieldPath, Mismatch};
pub use traits::*;
