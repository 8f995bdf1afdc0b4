//! Validator primitives.
//!
//! Every validator implements [`Validator`]: it checks one value and returns the
//! messages for that value's own path. Validators that need a backing-store
//! lookup additionally implement [`DeclareChecks`] and expose it through
//! [`Validator::as_declarer`]; the walker asks for those checks once the value
//! passed its structural rules.
//!
//! Rules run in a fixed order for every field, so messages are reproducible:
//!
//! 1. presence (`required`, `required_if`, `required_unless`, `nullable`)
//! 2. type
//! 3. the variant's own predicates, in the order they were added
//! 4. cross-field comparisons (`eq_field`, `ne_field`, `lt_field`, `gt_field`)
//! 5. custom hooks
//!
//! A type mismatch stops evaluation for the field.
//!
//! # Example
//!
//! ```rust
//! use term_gate::checks::Rule;
//! use term_gate::core::Schema;
//! use term_gate::validators::{ArrayValidator, NumberValidator, ObjectValidator, StringValidator};
//!
//! let schema = Schema::new()
//!     .field("email", StringValidator::new().required().trusted_pattern(r"^[^@\s]+@[^@\s]+$"))
//!     .field(
//!         "items",
//!         ArrayValidator::new().min_items(1).of(ObjectValidator::new(
//!             Schema::new().field(
//!                 "product_id",
//!                 NumberValidator::new()
//!                     .required()
//!                     .integer()
//!                     .exists(Rule::new("products", "id")),
//!             ),
//!         )),
//!     );
//! assert_eq!(schema.len(), 2);
//! ```

use crate::checks::{CheckSpec, DbCheck};
use crate::core::ValidationContext;
use crate::path::FieldPath;
use crate::value::{as_number, display_value, scalar_eq};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::sync::Arc;

mod array;
mod boolean;
mod choice;
mod file;
mod number;
mod object;
mod optional;
mod string;
mod union;

pub use array::ArrayValidator;
pub use boolean::BoolValidator;
pub use choice::{EnumValidator, LiteralValidator};
pub use file::FileValidator;
pub use number::NumberValidator;
pub use object::ObjectValidator;
pub use optional::OptionalValidator;
pub use string::StringValidator;
pub use union::UnionValidator;

/// Structural validation of one value.
pub trait Validator: Debug + Send + Sync {
    /// Validates `value` (absent when the key is missing) at `ctx.path()` and
    /// returns the messages for that path. Nested values report through `ctx`.
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String>;

    /// The check-declaring capability, when this validator has one.
    fn as_declarer(&self) -> Option<&dyn DeclareChecks> {
        None
    }
}

/// Declares backing-store lookups for a structurally valid value.
pub trait DeclareChecks {
    /// Returns the checks needed for `value` at `path`. Never performs I/O.
    fn declare_checks(&self, path: &FieldPath, value: Option<&Value>) -> Vec<DbCheck>;
}

/// User supplied rule: returns a message when the value is invalid.
pub type CustomRule = Arc<dyn Fn(&Value, &ValidationContext<'_>) -> Option<String> + Send + Sync>;

/// Comparison against another field of the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossField {
    /// Must equal the other field
    Eq(FieldPath),
    /// Must differ from the other field
    Ne(FieldPath),
    /// Must be less than the other field
    Lt(FieldPath),
    /// Must be greater than the other field
    Gt(FieldPath),
}

impl CrossField {
    fn check(&self, ctx: &ValidationContext<'_>, value: &Value) -> Option<String> {
        let path = ctx.path();
        match self {
            CrossField::Eq(other) => {
                let matches =
                    crate::path::lookup(ctx.root(), other).is_some_and(|o| same(value, o));
                (!matches).then(|| format!("{path} must match {other}"))
            }
            CrossField::Ne(other) => {
                let matches =
                    crate::path::lookup(ctx.root(), other).is_some_and(|o| same(value, o));
                matches.then(|| format!("{path} must differ from {other}"))
            }
            CrossField::Lt(other) => {
                let o = crate::path::lookup(ctx.root(), other)?;
                (compare(value, o)? != Ordering::Less)
                    .then(|| format!("{path} must be less than {other}"))
            }
            CrossField::Gt(other) => {
                let o = crate::path::lookup(ctx.root(), other)?;
                (compare(value, o)? != Ordering::Greater)
                    .then(|| format!("{path} must be greater than {other}"))
            }
        }
    }
}

fn same(a: &Value, b: &Value) -> bool {
    scalar_eq(a, b) || (!crate::value::is_scalar(a) && a == b)
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => None,
        },
    }
}

/// Outcome of presence gating.
#[derive(Debug)]
pub(crate) enum Gate<'v> {
    /// A value is present and must be validated
    Present(&'v Value),
    /// Nothing to validate
    Skip,
    /// Presence failed
    Fail(String),
}

/// Rules shared by all validator variants.
#[derive(Clone, Default)]
pub(crate) struct FieldRules {
    required: bool,
    nullable: bool,
    required_if: Vec<(FieldPath, Value)>,
    required_unless: Vec<(FieldPath, Value)>,
    cross: Vec<CrossField>,
    custom: Vec<CustomRule>,
    checks: Vec<CheckSpec>,
}

impl Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("nullable", &self.nullable)
            .field("required_if", &self.required_if)
            .field("required_unless", &self.required_unless)
            .field("cross", &self.cross)
            .field("custom", &self.custom.len())
            .field("checks", &self.checks)
            .finish()
    }
}

impl FieldRules {
    fn is_required(&self, ctx: &ValidationContext<'_>) -> bool {
        let matches = |(path, expected): &(FieldPath, Value)| {
            crate::path::lookup(ctx.root(), path).is_some_and(|v| same(v, expected))
        };
        self.required
            || self.required_if.iter().any(matches)
            || self.required_unless.iter().any(|c| !matches(c))
    }

    /// Presence gating. Absent values and nulls are skipped unless required;
    /// a nullable required field accepts an explicit null.
    pub(crate) fn gate<'v>(
        &self,
        ctx: &ValidationContext<'_>,
        value: Option<&'v Value>,
    ) -> Gate<'v> {
        match value {
            Some(Value::Null) if self.nullable => Gate::Skip,
            None | Some(Value::Null) => {
                if self.is_required(ctx) {
                    Gate::Fail(format!("{} is required", ctx.path()))
                } else {
                    Gate::Skip
                }
            }
            Some(v) => Gate::Present(v),
        }
    }

    /// Runs cross-field comparisons and custom hooks.
    pub(crate) fn finish(
        &self,
        ctx: &ValidationContext<'_>,
        value: &Value,
        messages: &mut Vec<String>,
    ) {
        messages.extend(self.cross.iter().filter_map(|c| c.check(ctx, value)));
        messages.extend(self.custom.iter().filter_map(|f| f(value, ctx)));
    }

    pub(crate) fn declare(&self, path: &FieldPath, value: Option<&Value>) -> Vec<DbCheck> {
        self.checks
            .iter()
            .filter_map(|spec| spec.declare(path, value))
            .collect()
    }
}

/// Builder methods shared by all validators.
macro_rules! field_rule_builders {
    ($ty:ty) => {
        impl $ty {
            /// The value must be present and not null.
            pub fn required(mut self) -> Self {
                self.rules.required = true;
                self
            }

            /// An explicit null is accepted, even when required.
            pub fn nullable(mut self) -> Self {
                self.rules.nullable = true;
                self
            }

            /// Required when the field at `path` equals `value`.
            pub fn required_if(mut self, path: &str, value: impl Into<serde_json::Value>) -> Self {
                self.rules
                    .required_if
                    .push(($crate::path::FieldPath::parse(path), value.into()));
                self
            }

            /// Required unless the field at `path` equals `value`.
            pub fn required_unless(
                mut self,
                path: &str,
                value: impl Into<serde_json::Value>,
            ) -> Self {
                self.rules
                    .required_unless
                    .push(($crate::path::FieldPath::parse(path), value.into()));
                self
            }

            /// Must equal the field at `path`.
            pub fn eq_field(mut self, path: &str) -> Self {
                self.rules
                    .cross
                    .push($crate::validators::CrossField::Eq($crate::path::FieldPath::parse(path)));
                self
            }

            /// Must differ from the field at `path`.
            pub fn ne_field(mut self, path: &str) -> Self {
                self.rules
                    .cross
                    .push($crate::validators::CrossField::Ne($crate::path::FieldPath::parse(path)));
                self
            }

            /// Must be less than the field at `path`.
            pub fn lt_field(mut self, path: &str) -> Self {
                self.rules
                    .cross
                    .push($crate::validators::CrossField::Lt($crate::path::FieldPath::parse(path)));
                self
            }

            /// Must be greater than the field at `path`.
            pub fn gt_field(mut self, path: &str) -> Self {
                self.rules
                    .cross
                    .push($crate::validators::CrossField::Gt($crate::path::FieldPath::parse(path)));
                self
            }

            /// Adds a custom rule returning a message on failure.
            pub fn custom<F>(mut self, rule: F) -> Self
            where
                F: Fn(&serde_json::Value, &$crate::core::ValidationContext<'_>) -> Option<String>
                    + Send
                    + Sync
                    + 'static,
            {
                self.rules.custom.push(std::sync::Arc::new(rule));
                self
            }
        }
    };
}

/// Exists/unique builders and the [`DeclareChecks`] capability.
macro_rules! check_builders {
    ($ty:ty) => {
        impl $ty {
            /// The value must exist in `rule`.
            pub fn exists(mut self, rule: $crate::checks::Rule) -> Self {
                self.rules.checks.push($crate::checks::CheckSpec::exists(rule));
                self
            }

            /// The value must not exist in `rule`.
            pub fn unique(mut self, rule: $crate::checks::Rule) -> Self {
                self.rules.checks.push($crate::checks::CheckSpec::unique(rule));
                self
            }

            /// Adds a fully configured exists/unique requirement, for an
            /// ignore value or a custom message.
            pub fn check(mut self, spec: $crate::checks::CheckSpec) -> Self {
                self.rules.checks.push(spec);
                self
            }
        }

        impl $crate::validators::DeclareChecks for $ty {
            fn declare_checks(
                &self,
                path: &$crate::path::FieldPath,
                value: Option<&serde_json::Value>,
            ) -> Vec<$crate::checks::DbCheck> {
                self.rules.declare(path, value)
            }
        }
    };
}

pub(crate) use check_builders;
pub(crate) use field_rule_builders;

/// Renders allowed values for "one of" messages.
pub(crate) fn list_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> String {
    values
        .into_iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(", ")
}
