//! Optional wrapper.

use super::{DeclareChecks, Validator};
use crate::core::ValidationContext;
use serde_json::Value;
use std::sync::Arc;

/// Skips absent and null values, otherwise defers to the wrapped validator,
/// including its declared checks. Wrapping a `required` validator relaxes it.
#[derive(Debug, Clone)]
pub struct OptionalValidator {
    inner: Arc<dyn Validator>,
}

impl OptionalValidator {
    /// Wraps `inner`.
    pub fn new(inner: impl Validator + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl Validator for OptionalValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        match value {
            None | Some(Value::Null) => Vec::new(),
            Some(_) => self.inner.validate(ctx, value),
        }
    }

    fn as_declarer(&self) -> Option<&dyn DeclareChecks> {
        self.inner.as_declarer()
    }
}
