//! Canonical keys for heterogeneous scalar values.
//!
//! Payloads arrive loosely typed: the same identifier may show up as `"42"` in
//! one field and `42` in another, while a backing store answers with whatever
//! type its column holds. Membership lookups and ignore-value comparisons go
//! through [`ScalarKey`] so all of those spellings compare equal.
//!
//! The rendering rules are:
//!
//! - strings render as themselves
//! - booleans render as `true` / `false`
//! - integers render in base 10
//! - floats with an integral value render as integers (`1.0` becomes `1`)
//! - other floats use their shortest round-trip form
//!
//! `null`, arrays and objects have no key.

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;

/// Canonical, type-erased form of a scalar used for equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScalarKey(String);

impl ScalarKey {
    /// Builds the key of a scalar value, or `None` for null and containers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Bool(b) => Some(Self(b.to_string())),
            Value::Number(n) => Some(Self(render_number(n))),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Returns the canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScalarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScalarKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Returns true for strings, numbers and booleans.
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Compares two values by canonical key. Non-scalars never compare equal.
pub fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (ScalarKey::from_value(a), ScalarKey::from_value(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Reads a value as a float, accepting numeric strings.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Short human rendering of a value for messages: strings unquoted.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
