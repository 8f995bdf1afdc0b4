//! Union validator: the first matching alternative wins.

use super::{field_rule_builders, FieldRules, Gate, Validator};
use crate::core::{validate_field, ValidationContext};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Accepts a value matching any of its alternatives.
///
/// Alternatives are tried in order, each in an isolated context. Only the
/// first alternative that validates cleanly contributes its declared checks,
/// and only when the union's own cross-field and custom rules pass too; the
/// errors of rejected alternatives are discarded.
///
/// ```rust
/// use term_gate::validators::{NumberValidator, StringValidator, UnionValidator};
///
/// let id = UnionValidator::new()
///     .or(NumberValidator::new().integer())
///     .or(StringValidator::new().trusted_pattern("^[0-9a-f]{8}$"));
/// # let _ = id;
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnionValidator {
    rules: FieldRules,
    variants: Vec<Arc<dyn Validator>>,
}

impl UnionValidator {
    /// Creates a union without alternatives; it rejects every present value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an alternative.
    pub fn or(mut self, variant: impl Validator + 'static) -> Self {
        self.variants.push(Arc::new(variant));
        self
    }
}

field_rule_builders!(UnionValidator);

impl Validator for UnionValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };

        for (n, variant) in self.variants.iter().enumerate() {
            let trial = ctx.scratch();
            if validate_field(&trial, variant.as_ref(), Some(value)) && !trial.has_errors() {
                let mut messages = Vec::new();
                self.rules.finish(ctx, value, &mut messages);
                if messages.is_empty() {
                    ctx.absorb(&trial);
                }
                return messages;
            }
            trace!(field = %ctx.path(), variant = n, "Union alternative rejected");
        }
        vec![format!("{} does not match any allowed type", ctx.path())]
    }
}
