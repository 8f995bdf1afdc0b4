//! Boolean validator.

use super::{field_rule_builders, FieldRules, Gate, Validator};
use crate::core::ValidationContext;
use serde_json::Value;

/// Validates boolean values.
#[derive(Debug, Clone, Default)]
pub struct BoolValidator {
    rules: FieldRules,
    accepted: bool,
}

impl BoolValidator {
    /// Creates a validator accepting `true` and `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value must be `true`, as for a terms checkbox.
    pub fn accepted(mut self) -> Self {
        self.accepted = true;
        self
    }
}

field_rule_builders!(BoolValidator);

impl Validator for BoolValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        let Some(flag) = value.as_bool() else {
            return vec![format!("{} must be a boolean", ctx.path())];
        };

        let mut messages = Vec::new();
        if self.accepted && !flag {
            messages.push(format!("{} must be accepted", ctx.path()));
        }
        self.rules.finish(ctx, value, &mut messages);
        messages
    }
}
