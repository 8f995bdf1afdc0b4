//! Nested object validator.

use super::{field_rule_builders, FieldRules, Gate, Validator};
use crate::core::{walk_schema, Schema, ValidationContext};
use serde_json::Value;

/// Validates a nested object against its own [`Schema`].
///
/// Nested field errors are recorded at their own paths (`address.city`); the
/// messages returned for the object itself only cover presence and type.
#[derive(Debug, Clone, Default)]
pub struct ObjectValidator {
    rules: FieldRules,
    schema: Schema,
    strict: bool,
}

impl ObjectValidator {
    /// Creates a validator for objects shaped by `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Rejects keys not declared in the schema.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// The nested schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

field_rule_builders!(ObjectValidator);

impl Validator for ObjectValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        let Some(object) = value.as_object() else {
            return vec![format!("{} must be an object", ctx.path())];
        };

        if self.strict {
            for key in object.keys().filter(|k| !self.schema.contains(k)) {
                let child = ctx.child_key(key);
                child.report(vec![format!("{} is not allowed", child.path())]);
            }
        }
        walk_schema(ctx, object, &self.schema);

        let mut messages = Vec::new();
        self.rules.finish(ctx, value, &mut messages);
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidateOptions;
    use crate::validators::{NumberValidator, StringValidator};
    use serde_json::{json, Map};

    fn address() -> ObjectValidator {
        ObjectValidator::new(
            Schema::new()
                .field("city", StringValidator::new().required())
                .field("zip", NumberValidator::new().integer()),
        )
    }

    #[test]
    fn test_nested_errors_use_nested_paths() {
        let root = Map::new();
        let options = ValidateOptions::new();
        let ctx = ValidationContext::new(&root, &options).child_key("address");

        let messages = address().validate(&ctx, Some(&json!({"zip": 1.5})));
        assert!(messages.is_empty());
        let (errors, _) = ctx.take_results();
        assert_eq!(errors.get("address.city").unwrap(), &["address.city is required".to_string()]);
        assert_eq!(
            errors.get("address.zip").unwrap(),
            &["address.zip must be an integer".to_string()]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let root = Map::new();
        let options = ValidateOptions::new();
        let ctx = ValidationContext::new(&root, &options).child_key("address");
        assert_eq!(
            address().validate(&ctx, Some(&json!([1]))),
            vec!["address must be an object"]
        );
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_strict_rejects_unknown_keys() {
        let root = Map::new();
        let options = ValidateOptions::new();
        let ctx = ValidationContext::new(&root, &options).child_key("address");
        address()
            .strict()
            .validate(&ctx, Some(&json!({"city": "Oslo", "planet": "Earth"})));
        let (errors, _) = ctx.take_results();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("address.planet").unwrap(),
            &["address.planet is not allowed".to_string()]
        );
    }
}
