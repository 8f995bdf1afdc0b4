//! Enum and literal validators.

use super::{
    check_builders, field_rule_builders, list_values, DeclareChecks, FieldRules, Gate, Validator,
};
use crate::core::ValidationContext;
use crate::value::scalar_eq;
use serde_json::Value;

/// The value must be one of a fixed set of scalars.
///
/// Comparison is canonical, so `1` matches an allowed `"1"`.
#[derive(Debug, Clone, Default)]
pub struct EnumValidator {
    rules: FieldRules,
    allowed: Vec<Value>,
}

impl EnumValidator {
    /// Creates a validator for `allowed`.
    pub fn new<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

field_rule_builders!(EnumValidator);
check_builders!(EnumValidator);

impl Validator for EnumValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        let mut messages = Vec::new();
        if !self.allowed.iter().any(|a| scalar_eq(a, value)) {
            messages.push(format!(
                "{} must be one of: {}",
                ctx.path(),
                list_values(&self.allowed)
            ));
            return messages;
        }
        self.rules.finish(ctx, value, &mut messages);
        messages
    }

    fn as_declarer(&self) -> Option<&dyn DeclareChecks> {
        Some(self)
    }
}

/// The value must equal one exact JSON value; `1` and `"1"` differ.
#[derive(Debug, Clone, Default)]
pub struct LiteralValidator {
    rules: FieldRules,
    expected: Value,
}

impl LiteralValidator {
    /// Creates a validator for `expected`.
    pub fn new(expected: impl Into<Value>) -> Self {
        Self {
            expected: expected.into(),
            ..Self::default()
        }
    }
}

field_rule_builders!(LiteralValidator);

impl Validator for LiteralValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        if *value != self.expected {
            return vec![format!("{} must be {}", ctx.path(), self.expected)];
        }
        let mut messages = Vec::new();
        self.rules.finish(ctx, value, &mut messages);
        messages
    }
}
