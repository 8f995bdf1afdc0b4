//! String validator.

use super::{check_builders, field_rule_builders, DeclareChecks, FieldRules, Gate, Validator};
use crate::core::ValidationContext;
use crate::pattern::PatternCache;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum StringRule {
    MinLen(usize),
    MaxLen(usize),
    /// `None` when the pattern failed to compile; the rule then passes.
    Pattern(Option<Arc<Regex>>),
    OneOf(Vec<String>),
}

/// Validates string values.
///
/// Lengths count characters, not bytes.
///
/// # Examples
///
/// ```rust
/// use term_gate::validators::StringValidator;
///
/// let sku = StringValidator::new()
///     .required()
///     .min_len(3)
///     .max_len(12)
///     .pattern(r"^[A-Z0-9-]+$");
/// # let _ = sku;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringValidator {
    rules: FieldRules,
    checks: Vec<StringRule>,
}

impl StringValidator {
    /// Creates a validator accepting any string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum length in characters.
    pub fn min_len(mut self, len: usize) -> Self {
        self.checks.push(StringRule::MinLen(len));
        self
    }

    /// Maximum length in characters.
    pub fn max_len(mut self, len: usize) -> Self {
        self.checks.push(StringRule::MaxLen(len));
        self
    }

    /// Must match `pattern`, compiled through the process-wide cache.
    ///
    /// An invalid pattern is logged and the rule never fails.
    pub fn pattern(self, pattern: &str) -> Self {
        self.pattern_with(&PatternCache::global(), pattern)
    }

    /// Same as [`pattern`](Self::pattern) with an explicit cache.
    pub fn pattern_with(mut self, cache: &PatternCache, pattern: &str) -> Self {
        self.checks
            .push(StringRule::Pattern(cache.compile_lenient(pattern)));
        self
    }

    /// Must match `pattern`, a pattern known at build time.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` does not compile.
    pub fn trusted_pattern(mut self, pattern: &str) -> Self {
        self.checks.push(StringRule::Pattern(Some(
            PatternCache::global().compile_trusted(pattern),
        )));
        self
    }

    /// Must be one of `values`.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks
            .push(StringRule::OneOf(values.into_iter().map(Into::into).collect()));
        self
    }
}

field_rule_builders!(StringValidator);
check_builders!(StringValidator);

impl Validator for StringValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        let path = ctx.path();
        let Some(text) = value.as_str() else {
            return vec![format!("{path} must be a string")];
        };

        let mut messages = Vec::new();
        let chars = text.chars().count();
        for rule in &self.checks {
            match rule {
                StringRule::MinLen(min) if chars < *min => {
                    messages.push(format!("{path} must be at least {min} characters"));
                }
                StringRule::MaxLen(max) if chars > *max => {
                    messages.push(format!("{path} must be at most {max} characters"));
                }
                StringRule::Pattern(Some(regex)) if !regex.is_match(text) => {
                    messages.push(format!("{path} has an invalid format"));
                }
                StringRule::OneOf(allowed) if !allowed.iter().any(|a| a == text) => {
                    messages.push(format!("{path} must be one of: {}", allowed.join(", ")));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckKind, CheckSpec, Rule};
    use crate::core::ValidateOptions;
    use crate::path::FieldPath;
    use serde_json::{json, Map};

    fn run(validator: &StringValidator, value: Option<Value>) -> Vec<String> {
        let root = Map::new();
        let options = ValidateOptions::new();
        let ctx = ValidationContext::new(&root, &options).child_key("code");
        validator.validate(&ctx, value.as_ref())
    }

    #[test]
    fn test_type_and_presence() {
        let v = StringValidator::new().required();
        assert_eq!(run(&v, None), vec!["code is required"]);
        assert_eq!(run(&v, Some(json!(5))), vec!["code must be a string"]);
        assert!(run(&v, Some(json!("x"))).is_empty());
        assert!(run(&StringValidator::new(), None).is_empty());
    }

    #[test]
    fn test_predicates_in_declaration_order() {
        let v = StringValidator::new()
            .max_len(2)
            .pattern("^[a-z]+$")
            .one_of(["ab", "cd"]);
        assert_eq!(
            run(&v, Some(json!("ABC"))),
            vec![
                "code must be at most 2 characters",
                "code has an invalid format",
                "code must be one of: ab, cd",
            ]
        );
        assert!(run(&v, Some(json!("ab"))).is_empty());
    }

    #[test]
    fn test_length_counts_chars() {
        let v = StringValidator::new().min_len(3).max_len(3);
        assert!(run(&v, Some(json!("héé"))).is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_inert() {
        let cache = PatternCache::new();
        let v = StringValidator::new().pattern_with(&cache, "([unclosed");
        assert!(run(&v, Some(json!("anything"))).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_trusted_pattern_panics_on_invalid() {
        let _ = StringValidator::new().trusted_pattern("([unclosed");
    }

    #[test]
    fn test_custom_runs_after_predicates() {
        let v = StringValidator::new()
            .min_len(5)
            .custom(|value, _| (value == "nope").then(|| "code is reserved".to_string()));
        assert_eq!(
            run(&v, Some(json!("nope"))),
            vec!["code must be at least 5 characters", "code is reserved"]
        );
    }

    #[test]
    fn test_declares_checks() {
        let v = StringValidator::new()
            .exists(Rule::new("codes", "code"))
            .check(CheckSpec::unique(Rule::new("archive", "code")).ignore("x"));
        let checks = v.declare_checks(&FieldPath::parse("code"), Some(&json!("abc")));
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].kind, CheckKind::Exists);
        assert_eq!(checks[1].ignore, Some(json!("x")));
        assert!(v.declare_checks(&FieldPath::parse("code"), None).is_empty());
        assert!(v.as_declarer().is_some());
    }
}
