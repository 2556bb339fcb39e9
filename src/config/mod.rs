//! Configuration parsing
//!
//! Handles parsing of check configuration files.
//!
//! ## Configuration Format
//!
//! ```yaml
//! defaults:
//!   base_url: https://reqres.in
//!   timeout: 10s
//!
//! checks:
//!   list-users:
//!     path: /api/users
//!     query:
//!       page: 2
//!     expect:
//!       status: 200
//!       field: page
//!       value: 2
//!
//!   single-user-missing:
//!     url: https://reqres.in/api/users/23
//!     timeout: 5s
//!     expect:
//!       status: 404
//! ```

mod file;

pub use file::{BASE_URL_ENV, CheckConfig, Config, ConfigError, Defaults, ExpectConfig};
