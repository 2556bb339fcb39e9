//! Configuration file types
//!
//! Defines the structure of check configuration files and turns them into
//! validated `ApiCheck`s.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::checks::{ApiCheck, CheckOptions, Expectation, ExpectationError};
use crate::client::{ApiRequest, RequestError};

/// Environment variable that overrides the base URL of every check
pub const BASE_URL_ENV: &str = "APICHECK_BASE_URL";

/// Errors that can occur during configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Check '{check}': {source}")]
    Request {
        check: String,
        #[source]
        source: RequestError,
    },

    #[error("Check '{check}': {source}")]
    Expectation {
        check: String,
        #[source]
        source: ExpectationError,
    },
}

/// Settings shared by all checks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    /// Base URL that check paths are appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Timeout for checks that don't set their own
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

/// What the response of a check must look like
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectConfig {
    /// Expected status code
    #[serde(default = "default_status")]
    pub status: u16,

    /// Dotted path of a JSON field to compare
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Expected value of `field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

fn default_status() -> u16 {
    200
}

impl Default for ExpectConfig {
    fn default() -> Self {
        Self {
            status: default_status(),
            field: None,
            value: None,
        }
    }
}

/// Configuration for a single check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Whether this check is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Absolute URL; takes precedence over `base_url` + `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Base URL for this check only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Path appended to the base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Query parameters, sent in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub query: IndexMap<String, Value>,

    /// Timeout for this check
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,

    /// Expected response
    #[serde(default)]
    pub expect: ExpectConfig,
}

fn default_enabled() -> bool {
    true
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            base_url: None,
            path: None,
            query: IndexMap::new(),
            timeout: None,
            expect: ExpectConfig::default(),
        }
    }
}

impl CheckConfig {
    /// Build the request this check sends
    pub fn to_request(&self, name: &str, defaults: &Defaults) -> Result<ApiRequest, ConfigError> {
        let request_err = |source| ConfigError::Request {
            check: name.to_string(),
            source,
        };

        let mut request = if let Some(url) = &self.url {
            ApiRequest::get(url).map_err(request_err)?
        } else {
            let base_url = self
                .base_url
                .as_deref()
                .or(defaults.base_url.as_deref())
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "check '{name}' has neither url nor base_url (set one, or defaults.base_url)"
                    ))
                })?;
            ApiRequest::from_parts(base_url, self.path.as_deref().unwrap_or("/"))
                .map_err(request_err)?
        };

        for (key, value) in &self.query {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "check '{name}': query parameter '{key}' must be a scalar, got {other}"
                    )));
                }
            };
            request = request.with_query(key, value);
        }

        Ok(request)
    }

    /// Build the expectation the response is held to
    pub fn to_expectation(&self, name: &str) -> Result<Expectation, ConfigError> {
        let expectation_err = |source| ConfigError::Expectation {
            check: name.to_string(),
            source,
        };

        let expectation = Expectation::status(self.expect.status).map_err(expectation_err)?;

        match (&self.expect.field, &self.expect.value) {
            (Some(field), Some(value)) => expectation
                .with_field(field, value.clone())
                .map_err(expectation_err),
            (None, None) => Ok(expectation),
            (Some(field), None) => Err(ConfigError::Invalid(format!(
                "check '{name}': field '{field}' has no expected value"
            ))),
            (None, Some(_)) => Err(ConfigError::Invalid(format!(
                "check '{name}': expected value given without a field"
            ))),
        }
    }

    /// Convert to CheckOptions
    pub fn to_check_options(&self, defaults: &Defaults) -> CheckOptions {
        CheckOptions {
            timeout: self.timeout.or(defaults.timeout),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Shared settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Check configurations (check_name -> config), in file order
    #[serde(default)]
    pub checks: IndexMap<String, CheckConfig>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Point every check addressed by path at a different base URL
    ///
    /// Checks with an absolute `url` are left alone.
    pub fn with_base_url_override(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        for check in self.checks.values_mut() {
            if check.base_url.is_some() {
                check.base_url = Some(base_url.clone());
            }
        }
        self.defaults.base_url = Some(base_url);
        self
    }

    /// Get configuration for a specific check
    pub fn check_config(&self, name: &str) -> Option<&CheckConfig> {
        self.checks.get(name)
    }

    /// Check if a specific check is enabled
    pub fn is_check_enabled(&self, name: &str) -> bool {
        self.checks.get(name).map(|c| c.enabled).unwrap_or(false)
    }

    /// Get list of enabled checks, in file order
    pub fn enabled_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, c)| c.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Build one check and its options
    pub fn build_check(&self, name: &str) -> Result<(ApiCheck, CheckOptions), ConfigError> {
        let check = self
            .checks
            .get(name)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown check '{name}'")))?;

        let request = check.to_request(name, &self.defaults)?;
        let expectation = check.to_expectation(name)?;

        Ok((
            ApiCheck::new(name, request, expectation),
            check.to_check_options(&self.defaults),
        ))
    }

    /// Build every enabled check, in file order
    pub fn build_checks(&self) -> Result<Vec<(ApiCheck, CheckOptions)>, ConfigError> {
        self.enabled_checks()
            .into_iter()
            .map(|name| self.build_check(name))
            .collect()
    }

    /// Build the checks named in a comma-separated list, in list order
    ///
    /// Unknown names are skipped with a warning. Disabled checks still run
    /// when named explicitly.
    pub fn select_checks(&self, names: &str) -> Result<Vec<(ApiCheck, CheckOptions)>, ConfigError> {
        names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter(|name| {
                let known = self.checks.contains_key(*name);
                if !known {
                    warn!(check = name, "Unknown check, skipping");
                }
                known
            })
            .map(|name| self.build_check(name))
            .collect()
    }

    /// Generate a default configuration
    pub fn default_config() -> Self {
        let mut checks = IndexMap::new();
        checks.insert(
            "list-users".to_string(),
            CheckConfig {
                path: Some("/api/users".to_string()),
                query: IndexMap::from([("page".to_string(), Value::from(2))]),
                expect: ExpectConfig {
                    status: 200,
                    field: Some("page".to_string()),
                    value: Some(Value::from(2)),
                },
                ..CheckConfig::default()
            },
        );

        Config {
            defaults: Defaults {
                base_url: Some("https://reqres.in".to_string()),
                timeout: Some(Duration::from_secs(10)),
            },
            checks,
        }
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r"
defaults:
  base_url: https://example.test
  timeout: 5s

checks:
  list-users:
    path: /api/users
    query:
      page: 2
      active: true
    expect:
      status: 200
      field: page
      value: 2
  missing-user:
    url: https://other.test/api/users/23
    timeout: 500ms
    expect:
      status: 404
  disabled:
    enabled: false
    path: /api/unknown
";

    #[test]
    fn test_parse_config() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        assert_eq!(
            config.defaults.base_url.as_deref(),
            Some("https://example.test")
        );
        assert_eq!(config.defaults.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.checks.len(), 3);
    }

    #[test]
    fn test_checks_keep_file_order() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.enabled_checks(), vec!["list-users", "missing-user"]);
    }

    #[test]
    fn test_check_enabled() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        assert!(config.is_check_enabled("list-users"));
        assert!(!config.is_check_enabled("disabled"));
        assert!(!config.is_check_enabled("unknown"));
    }

    #[test]
    fn test_build_check_from_path() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        let (check, opts) = config.build_check("list-users").unwrap();

        assert_eq!(check.name(), "list-users");
        assert_eq!(
            check.request().full_url().as_str(),
            "https://example.test/api/users?page=2&active=true"
        );
        assert_eq!(check.expectation().to_string(), "status 200, page == 2");
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_build_check_from_url() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        let (check, opts) = config.build_check("missing-user").unwrap();

        assert_eq!(
            check.request().full_url().as_str(),
            "https://other.test/api/users/23"
        );
        assert_eq!(check.expectation().expected_status(), 404);
        assert!(check.expectation().field().is_none());
        assert_eq!(opts.timeout, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_build_checks_skips_disabled() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        let checks = config.build_checks().unwrap();
        let names: Vec<_> = checks.iter().map(|(c, _)| c.name()).collect();
        assert_eq!(names, vec!["list-users", "missing-user"]);
    }

    #[test]
    fn test_base_url_override() {
        let config = Config::from_yaml(SAMPLE_CONFIG)
            .unwrap()
            .with_base_url_override("http://127.0.0.1:9999");

        let (check, _) = config.build_check("list-users").unwrap();
        assert_eq!(
            check.request().url().as_str(),
            "http://127.0.0.1:9999/api/users"
        );

        // Absolute urls are untouched
        let (check, _) = config.build_check("missing-user").unwrap();
        assert_eq!(check.request().url().host_str(), Some("other.test"));
    }

    #[test]
    fn test_base_url_override_replaces_check_base_url() {
        let yaml = r"
checks:
  own-host:
    base_url: https://own.test
    path: /x
";
        let config = Config::from_yaml(yaml)
            .unwrap()
            .with_base_url_override("http://127.0.0.1:1");

        let (check, _) = config.build_check("own-host").unwrap();
        assert_eq!(check.request().url().as_str(), "http://127.0.0.1:1/x");
    }

    #[test]
    fn test_select_checks() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        let checks = config
            .select_checks("missing-user, nope,,list-users")
            .unwrap();
        let names: Vec<_> = checks.iter().map(|(c, _)| c.name()).collect();
        assert_eq!(names, vec!["missing-user", "list-users"]);
    }

    #[test]
    fn test_select_checks_unknown_only() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        assert!(config.select_checks("nope,other").unwrap().is_empty());
    }

    #[test]
    fn test_missing_base_url() {
        let config = Config::from_yaml("checks:\n  a:\n    path: /x\n").unwrap();
        let err = config.build_check("a").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_status() {
        let yaml = "checks:\n  a:\n    url: https://example.test\n    expect:\n      status: 700\n";
        let config = Config::from_yaml(yaml).unwrap();
        let err = config.build_check("a").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Expectation {
                source: ExpectationError::InvalidStatus(700),
                ..
            }
        ));
    }

    #[test]
    fn test_field_without_value() {
        let yaml = "checks:\n  a:\n    url: https://example.test\n    expect:\n      field: page\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.build_check("a").unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn test_non_http_url() {
        let yaml = "checks:\n  a:\n    url: ftp://example.test/file\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.build_check("a").unwrap_err(),
            ConfigError::Request {
                source: RequestError::UnsupportedScheme(_),
                ..
            }
        ));
    }

    #[test]
    fn test_nested_query_value_rejected() {
        let yaml = "defaults:\n  base_url: https://example.test\nchecks:\n  a:\n    query:\n      ids: [1, 2]\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.build_check("a").unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        let checks = config.build_checks().unwrap();
        assert_eq!(checks.len(), 1);

        let (check, _) = &checks[0];
        assert_eq!(
            check.request().full_url().as_str(),
            "https://reqres.in/api/users?page=2"
        );
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default_config();
        let yaml = config.to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.defaults.base_url, parsed.defaults.base_url);
        assert_eq!(config.defaults.timeout, parsed.defaults.timeout);
        assert_eq!(
            parsed.checks["list-users"].expect.value,
            Some(Value::from(2))
        );
    }
}
