//! Expectations and JSON field paths
//!
//! An `Expectation` pins the status code and, optionally, the value of one
//! field in the JSON body. Field paths use dotted notation with numeric
//! segments or `[n]` suffixes for array elements:
//!
//! - `page`
//! - `support.url`
//! - `data.0.email` or `data[0].email`

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::traits::CheckError;
use crate::client::ApiResponse;

/// Errors building an expectation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpectationError {
    #[error("Invalid expected status code {0} (must be within 100-599)")]
    InvalidStatus(u16),

    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// A response that did not match its expectation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Mismatch {
    #[error("status code mismatch: expected {expected}, got {actual}")]
    Status { expected: u16, actual: u16 },

    #[error("field '{path}' mismatch: expected {expected}, got {actual}")]
    Field {
        path: String,
        expected: Value,
        actual: Value,
    },

    #[error("field '{path}' not found in response body")]
    FieldMissing { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object key, or array index when the segment is numeric
    Key(String),
    /// Explicit `[n]` array index
    Index(usize),
}

/// Path to a field inside a JSON document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a dotted field path
    pub fn parse(path: &str) -> Result<Self, ExpectationError> {
        let invalid = |reason: &str| ExpectationError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(i) => (&part[..i], &part[i..]),
                None => (part, ""),
            };

            if name.is_empty() && rest.is_empty() {
                return Err(invalid("empty segment"));
            }
            if name.contains(']') {
                return Err(invalid("']' without a matching '['"));
            }
            if !name.is_empty() {
                segments.push(Segment::Key(name.to_string()));
            }

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                if !rest.starts_with('[') {
                    return Err(invalid("unexpected characters after ']'"));
                }
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| invalid("array index must be a non-negative integer"))?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
            }
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolve the path against a JSON document
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |value, segment| match (segment, value) {
                (Segment::Key(key), Value::Object(map)) => map.get(key),
                (Segment::Key(key), Value::Array(items)) => {
                    key.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                (Segment::Index(i), Value::Array(items)) => items.get(*i),
                _ => None,
            })
    }
}

impl FromStr for FieldPath {
    type Err = ExpectationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Expected value of one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpectation {
    pub path: FieldPath,
    pub value: Value,
}

impl FieldExpectation {
    /// Compare the field in `body` against the expected value
    pub fn check(&self, body: &Value) -> Result<(), Mismatch> {
        let actual = self
            .path
            .lookup(body)
            .ok_or_else(|| Mismatch::FieldMissing {
                path: self.path.to_string(),
            })?;

        if values_match(&self.value, actual) {
            Ok(())
        } else {
            Err(Mismatch::Field {
                path: self.path.to_string(),
                expected: self.value.clone(),
                actual: actual.clone(),
            })
        }
    }
}

/// What a response must look like for a check to pass
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    status: u16,
    field: Option<FieldExpectation>,
}

impl Expectation {
    /// Expect a status code
    pub fn status(status: u16) -> Result<Self, ExpectationError> {
        if !(100..=599).contains(&status) {
            return Err(ExpectationError::InvalidStatus(status));
        }
        Ok(Self {
            status,
            field: None,
        })
    }

    /// Additionally expect a JSON field to equal `value`
    pub fn with_field(
        mut self,
        path: &str,
        value: impl Into<Value>,
    ) -> Result<Self, ExpectationError> {
        self.field = Some(FieldExpectation {
            path: FieldPath::parse(path)?,
            value: value.into(),
        });
        Ok(self)
    }

    /// Expected status code
    pub fn expected_status(&self) -> u16 {
        self.status
    }

    /// Expected field, if any
    pub fn field(&self) -> Option<&FieldExpectation> {
        self.field.as_ref()
    }

    /// Compare a status code against the expected one
    pub fn check_status(&self, actual: u16) -> Result<(), Mismatch> {
        if actual == self.status {
            Ok(())
        } else {
            Err(Mismatch::Status {
                expected: self.status,
                actual,
            })
        }
    }

    /// Evaluate a response: status first, then the field
    ///
    /// The body is only parsed when a field is expected.
    pub fn evaluate(&self, response: &ApiResponse) -> Result<(), CheckError> {
        self.check_status(response.status())?;

        if let Some(field) = &self.field {
            let body = response.json()?;
            field.check(&body)?;
        }

        Ok(())
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(field) = &self.field {
            write!(f, ", {} == {}", field.path, field.value)?;
        }
        Ok(())
    }
}

/// JSON equality where numbers compare by value, so `2` matches `2.0`
fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => {
            if let (Some(x), Some(y)) = (e.as_i64(), a.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (e.as_u64(), a.as_u64()) {
                x == y
            } else {
                matches!((e.as_f64(), a.as_f64()), (Some(x), Some(y)) if x == y)
            }
        }
        (Value::Array(e), Value::Array(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(e), Value::Object(a)) => {
            e.len() == a.len()
                && e.iter()
                    .all(|(k, v)| a.get(k).is_some_and(|av| values_match(v, av)))
        }
        _ => expected == actual,
    }
}
