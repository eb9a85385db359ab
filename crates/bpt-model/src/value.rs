//! Value shape inference
//!
//! Raw JSON values are classified into a small set of shapes. A string equal
//! to one of the type keywords (`"string"`, `"number"`, `"boolean"`, `"UUID"`,
//! `"unknown"`) is a *sentinel*: it stands for "any value of this shape".

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inferred shape of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "UUID")]
    Identifier,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "undefined")]
    Undefined,
}

impl ValueType {
    /// Canonical keyword
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Identifier => "UUID",
            Self::Object => "object",
            Self::Array => "array",
            Self::Unknown => "unknown",
            Self::Undefined => "undefined",
        }
    }

    /// Parse a type keyword usable as a sentinel
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "UUID" => Some(Self::Identifier),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Sentinel type if `value` is a type keyword string
    #[must_use]
    pub fn sentinel(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::from_keyword)
    }

    /// Classify a raw value
    #[must_use]
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => Self::Undefined,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(s) => Self::from_keyword(s).unwrap_or_else(|| {
                if uuid::Uuid::parse_str(s).is_ok() {
                    Self::Identifier
                } else {
                    Self::String
                }
            }),
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// True if a declaration of type `self` can hold a value inferred as `expected`.
    ///
    /// Identifiers travel as strings, and `unknown` on either side accepts anything.
    #[must_use]
    pub fn accepts(&self, expected: ValueType) -> bool {
        *self == expected
            || *self == Self::Unknown
            || expected == Self::Unknown
            || (*self == Self::String && expected == Self::Identifier)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Truthiness as the observed application defines it: null, false, zero and
/// the empty string are falsy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// True for null and whitespace-only strings
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Equality that treats `1` and `1.0` as the same number
#[must_use]
pub fn numeric_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| numeric_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| numeric_eq(x, y)))
        }
        _ => a == b,
    }
}
