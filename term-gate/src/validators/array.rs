//! Array validator with an optional worker pool for large arrays.

use super::{field_rule_builders, FieldRules, Gate, Validator};
use crate::core::{validate_field, ValidationContext};
use crate::value::ScalarKey;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum ArrayRule {
    MinItems(usize),
    MaxItems(usize),
    Distinct,
}

/// Validates arrays and, optionally, every element.
///
/// Elements are validated on [`ValidateOptions::array_workers`] threads once
/// the array reaches [`ValidateOptions::array_parallel_threshold`] items.
/// Errors and declared checks come out in the same order either way.
///
/// [`ValidateOptions::array_workers`]: crate::core::ValidateOptions::array_workers
/// [`ValidateOptions::array_parallel_threshold`]: crate::core::ValidateOptions::array_parallel_threshold
#[derive(Debug, Clone, Default)]
pub struct ArrayValidator {
    rules: FieldRules,
    checks: Vec<ArrayRule>,
    element: Option<Arc<dyn Validator>>,
}

impl ArrayValidator {
    /// Creates a validator accepting any array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum number of items.
    pub fn min_items(mut self, min: usize) -> Self {
        self.checks.push(ArrayRule::MinItems(min));
        self
    }

    /// Maximum number of items.
    pub fn max_items(mut self, max: usize) -> Self {
        self.checks.push(ArrayRule::MaxItems(max));
        self
    }

    /// Scalar items must be pairwise distinct (`1` and `"1"` count as equal).
    pub fn distinct(mut self) -> Self {
        self.checks.push(ArrayRule::Distinct);
        self
    }

    /// Validates every element with `element`.
    pub fn of(mut self, element: impl Validator + 'static) -> Self {
        self.element = Some(Arc::new(element));
        self
    }

    fn validate_elements(
        &self,
        ctx: &ValidationContext<'_>,
        items: &[Value],
        element: &dyn Validator,
    ) {
        let options = ctx.options();
        let workers = options.array_workers();
        if workers <= 1 || items.len() < options.array_parallel_threshold() {
            validate_chunk(ctx, 0, items, element);
            return;
        }

        let chunk_len = (items.len() + workers - 1) / workers;
        debug!(
            field = %ctx.path(),
            items = items.len(),
            workers,
            "Validating array elements in parallel"
        );
        let scratches: Vec<ValidationContext<'_>> = thread::scope(|scope| {
            let handles: Vec<_> = items
                .chunks(chunk_len)
                .enumerate()
                .map(|(n, chunk)| {
                    scope.spawn(move || {
                        let scratch = ctx.scratch();
                        validate_chunk(&scratch, n * chunk_len, chunk, element);
                        scratch
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        for scratch in &scratches {
            if options.is_abort_early() && ctx.has_errors() {
                break;
            }
            ctx.absorb(scratch);
        }
    }
}

/// Validates `items` as elements `offset..` of the array at `ctx`.
fn validate_chunk(
    ctx: &ValidationContext<'_>,
    offset: usize,
    items: &[Value],
    element: &dyn Validator,
) {
    let abort_early = ctx.options().is_abort_early();
    for (i, item) in items.iter().enumerate() {
        validate_field(&ctx.child_index(offset + i), element, Some(item));
        if abort_early && ctx.has_errors() {
            return;
        }
    }
}

field_rule_builders!(ArrayValidator);

impl Validator for ArrayValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        let path = ctx.path();
        let Some(items) = value.as_array() else {
            return vec![format!("{path} must be an array")];
        };

        let mut messages = Vec::new();
        for rule in &self.checks {
            match *rule {
                ArrayRule::MinItems(min) if items.len() < min => {
                    messages.push(format!("{path} must have at least {min} items"));
                }
                ArrayRule::MaxItems(max) if items.len() > max => {
                    messages.push(format!("{path} must have at most {max} items"));
                }
                ArrayRule::Distinct => {
                    let mut seen = HashSet::new();
                    let duplicate = items
                        .iter()
                        .filter_map(ScalarKey::from_value)
                        .any(|key| !seen.insert(key));
                    if duplicate {
                        messages.push(format!("{path} must not contain duplicates"));
                    }
                }
                _ => {}
            }
        }

        if let Some(element) = &self.element {
            self.validate_elements(ctx, items, element.as_ref());
        }
        self.rules.finish(ctx, value, &mut messages);
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Rule;
    use crate::core::{Schema, ValidateOptions};
    use crate::validators::{NumberValidator, ObjectValidator, StringValidator};
    use serde_json::{json, Map};

    #[test]
    fn test_item_counts_and_distinct() {
        let root = Map::new();
        let options = ValidateOptions::new();
        let ctx = ValidationContext::new(&root, &options).child_key("tags");
        let v = ArrayValidator::new().min_items(1).max_items(2).distinct();

        assert_eq!(v.validate(&ctx, Some(&json!([]))), vec!["tags must have at least 1 items"]);
        assert_eq!(
            v.validate(&ctx, Some(&json!([1, "1", 2]))),
            vec!["tags must have at most 2 items", "tags must not contain duplicates"]
        );
        assert_eq!(v.validate(&ctx, Some(&json!("a"))), vec!["tags must be an array"]);
    }

    #[test]
    fn test_element_errors_at_indexed_paths() {
        let root = Map::new();
        let options = ValidateOptions::new();
        let ctx = ValidationContext::new(&root, &options).child_key("tags");
        let v = ArrayValidator::new().of(StringValidator::new().max_len(3));

        assert!(v.validate(&ctx, Some(&json!(["ok", "too long", 5]))).is_empty());
        let (errors, _) = ctx.take_results();
        assert_eq!(
            errors.get("tags.1").unwrap(),
            &["tags.1 must be at most 3 characters".to_string()]
        );
        assert_eq!(errors.get("tags.2").unwrap(), &["tags.2 must be a string".to_string()]);
        assert!(errors.get("tags.0").is_none());
    }

    fn items(n: usize) -> Value {
        Value::Array(
            (0..n)
                .map(|i| if i % 7 == 3 { json!({"id": "bad"}) } else { json!({"id": i}) })
                .collect(),
        )
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let root = Map::new();
        let v = ArrayValidator::new().of(ObjectValidator::new(
            Schema::new().field("id", NumberValidator::new().exists(Rule::new("t", "id"))),
        ));
        let data = items(100);

        let run = |options: ValidateOptions| {
            let ctx = ValidationContext::new(&root, &options).child_key("items");
            v.validate(&ctx, Some(&data));
            let (errors, mut checks) = ctx.take_results();
            let paths: Vec<String> = checks.drain().map(|c| c.path.to_string()).collect();
            (errors, paths)
        };

        let (seq_errors, seq_paths) = run(ValidateOptions::new());
        let (par_errors, par_paths) = run(ValidateOptions::new().with_array_workers(4, 10));
        assert_eq!(seq_errors, par_errors);
        assert_eq!(seq_paths, par_paths);
        assert_eq!(seq_paths.len(), 100 - 14);
        assert_eq!(seq_paths[0], "items.0.id");
    }
}
