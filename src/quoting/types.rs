//! Quote types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A foreign-exchange quote.
///
/// The bid is kept as the exact text the source sent; it is never parsed
/// into a float on its way through the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Bid price as decimal text (e.g. "5.4312").
    pub bid: String,
}

impl Quote {
    /// Create a quote from its bid text.
    pub fn new(bid: impl Into<String>) -> Self {
        Self { bid: bid.into() }
    }

    /// Bid price as decimal text.
    pub fn bid(&self) -> &str {
        &self.bid
    }
}

/// Error returned for malformed field paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field path `{0}`: segments must be non-empty")]
pub struct FieldPathError(String);

/// Dot-separated path of object keys leading to the bid inside a JSON body.
///
/// `USDBRL.bid` matches `{"USDBRL": {"bid": "5.43"}}`, `bid` matches
/// `{"bid": "5.43"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Path of the bid in the upstream quote source payload.
    pub fn source_bid() -> Self {
        Self(vec!["USDBRL".to_string(), "bid".to_string()])
    }

    /// Path of the bid in the relay's own response.
    pub fn relay_bid() -> Self {
        Self(vec!["bid".to_string()])
    }

    /// Walk the path and return the string at its end.
    ///
    /// Returns `None` if any key is missing, an intermediate value is not an
    /// object, or the final value is not a JSON string.
    pub fn extract<'a>(&self, value: &'a Value) -> Option<&'a str> {
        self.0
            .iter()
            .try_fold(value, |node, key| node.as_object()?.get(key))?
            .as_str()
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(FieldPathError(s.to_string()));
        }
        Ok(Self(segments))
    }
}

impl TryFrom<String> for FieldPath {
    type Error = FieldPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}
