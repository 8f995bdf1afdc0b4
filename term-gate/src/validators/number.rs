//! Number validator.

use super::{check_builders, field_rule_builders, DeclareChecks, FieldRules, Gate, Validator};
use crate::core::ValidationContext;
use crate::value::as_number;
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
enum NumberRule {
    Min(f64),
    Max(f64),
    Integer,
}

/// Validates numeric values.
///
/// JSON numbers are always accepted. Numeric strings such as `"42"` are
/// accepted only with [`allow_numeric_strings`](Self::allow_numeric_strings).
#[derive(Debug, Clone, Default)]
pub struct NumberValidator {
    rules: FieldRules,
    checks: Vec<NumberRule>,
    numeric_strings: bool,
}

impl NumberValidator {
    /// Creates a validator accepting any number.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.checks.push(NumberRule::Min(min));
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.checks.push(NumberRule::Max(max));
        self
    }

    /// Rejects values with a fractional part.
    pub fn integer(mut self) -> Self {
        self.checks.push(NumberRule::Integer);
        self
    }

    /// Accepts strings that parse as numbers.
    pub fn allow_numeric_strings(mut self) -> Self {
        self.numeric_strings = true;
        self
    }

    fn read(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(_) => as_number(value),
            Value::String(_) if self.numeric_strings => as_number(value),
            _ => None,
        }
    }
}

field_rule_builders!(NumberValidator);
check_builders!(NumberValidator);

impl Validator for NumberValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        let path = ctx.path();
        let Some(number) = self.read(value).filter(|n| n.is_finite()) else {
            return vec![format!("{path} must be a number")];
        };

        let mut messages = Vec::new();
        for rule in &self.checks {
            match *rule {
                NumberRule::Min(min) if number < min => {
                    messages.push(format!("{path} must be at least {min}"));
                }
                NumberRule::Max(max) if number > max => {
                    messages.push(format!("{path} must be at most {max}"));
                }
                NumberRule::Integer if number.fract() != 0.0 => {
                    messages.push(format!("{path} must be an integer"));
                }
                _ => {}
            }
        }
        self.rules.finish(ctx, value, &mut messages);
        messages
    }

    fn as_declarer(&self) -> Option<&dyn DeclareChecks> {
        Some(self)
    }
}
