//! Schema walking and the two-phase validation pipeline.
//!
//! Phase one walks the payload against a [`Schema`], recording structural
//! errors and collecting the exists/unique checks declared by valid fields.
//! Phase two groups those checks into batch lookups, runs them against the
//! configured [`DbChecker`](crate::checks::DbChecker) and reconciles the
//! membership answers back into per-field errors.

use super::{ValidateOptions, ValidationContext, ValidationErrors};
use crate::checks::{execute, group_checks, reconcile, CheckCollector};
use crate::validators::Validator;
use crate::DataObject;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Ordered set of named field validators.
///
/// Fields are validated in insertion order; adding an existing name replaces
/// its validator in place.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, Arc<dyn Validator>)>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field validator.
    pub fn field(mut self, name: impl Into<String>, validator: impl Validator + 'static) -> Self {
        self.insert(name.into(), Arc::new(validator));
        self
    }

    /// Adds an already shared field validator.
    pub fn field_arc(mut self, name: impl Into<String>, validator: Arc<dyn Validator>) -> Self {
        self.insert(name.into(), validator);
        self
    }

    fn insert(&mut self, name: String, validator: Arc<dyn Validator>) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = validator,
            None => self.fields.push((name, validator)),
        }
    }

    /// Fields in validation order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Arc<dyn Validator>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Whether `name` is a declared field.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates `data` against this schema. See [`validate`].
    pub async fn validate(
        &self,
        data: &DataObject,
        options: &ValidateOptions,
    ) -> Result<(), ValidationErrors> {
        validate(data, self, options).await
    }
}

/// Validates one value with `validator` at `ctx`'s path.
///
/// Messages are recorded for the path. Checks are declared only when the value
/// produced no messages of its own. Returns whether the value was valid.
pub fn validate_field(
    ctx: &ValidationContext<'_>,
    validator: &dyn Validator,
    value: Option<&Value>,
) -> bool {
    let messages = validator.validate(ctx, value);
    if !messages.is_empty() {
        ctx.report(messages);
        return false;
    }
    if let Some(declarer) = validator.as_declarer() {
        let checks = declarer.declare_checks(ctx.path(), value);
        if !checks.is_empty() {
            let log = ctx.options().log_config();
            crate::log_check!(
                log,
                field = %ctx.path(),
                value = %value.map(|v| log.loggable(v)).unwrap_or_default(),
                checks = checks.len(),
                "Declared checks"
            );
        }
        ctx.declare(checks);
    }
    true
}

/// Validates the fields of `object` below `ctx`.
///
/// With abort-early enabled the walk stops at the first field that leaves an
/// error in the walk state.
pub fn walk_schema(ctx: &ValidationContext<'_>, object: &DataObject, schema: &Schema) {
    let abort_early = ctx.options().is_abort_early();
    for (name, validator) in schema.fields() {
        let child = ctx.child_key(name);
        validate_field(&child, validator.as_ref(), object.get(name));
        if abort_early && ctx.has_errors() {
            debug!(field = %child.path(), "Stopping walk at first failure");
            return;
        }
    }
}

fn collect(
    data: &DataObject,
    schema: &Schema,
    options: &ValidateOptions,
) -> (ValidationErrors, CheckCollector) {
    let ctx = ValidationContext::new(data, options);
    walk_schema(&ctx, data, schema);
    ctx.take_results()
}

/// Validates `data` against `schema`.
///
/// External checks run only when a checker is configured, at least one check
/// was declared, and the walk produced no errors (unless
/// [`ValidateOptions::check_on_structural_errors`] is set). Abort-early always
/// skips them once an error exists. All failures, structural and external,
/// come back in one [`ValidationErrors`].
///
/// # Examples
///
/// ```rust
/// use term_gate::checks::{InMemoryChecker, Rule};
/// use term_gate::core::{validate, Schema, ValidateOptions};
/// use term_gate::validators::StringValidator;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let schema = Schema::new().field(
///     "email",
///     StringValidator::new().required().unique(Rule::new("users", "email")),
/// );
/// let checker = InMemoryChecker::new().with_rows("users", vec![json!({"email": "taken@x.io"})]);
/// let options = ValidateOptions::new().with_checker(Arc::new(checker));
///
/// let data = json!({"email": "taken@x.io"});
/// let errors = validate(data.as_object().unwrap(), &schema, &options).await.unwrap_err();
/// assert_eq!(errors.get("email").unwrap(), &["email already exists".to_string()]);
/// # }
/// ```
#[instrument(skip_all, fields(fields = schema.len()))]
pub async fn validate(
    data: &DataObject,
    schema: &Schema,
    options: &ValidateOptions,
) -> Result<(), ValidationErrors> {
    let (mut errors, mut collector) = collect(data, schema, options);

    if errors.has_errors()
        && (options.is_abort_early() || !options.runs_checks_on_structural_errors())
    {
        debug!(fields = errors.len(), "Structural errors, skipping external checks");
        return Err(errors);
    }

    let Some(checker) = options.checker() else {
        if !collector.is_empty() {
            debug!(checks = collector.len(), "No checker configured, skipping external checks");
        }
        return errors.into_result();
    };
    if collector.is_empty() {
        return errors.into_result();
    }

    let groups = group_checks(collector.drain(), options.grouping(), options.pools());
    info!(
        checks = groups.iter().map(|g| g.checks.len()).sum::<usize>(),
        groups = groups.len(),
        "Running external checks"
    );
    let outcomes = execute(options.cancellation(), checker, groups).await;
    errors.merge(reconcile(&outcomes, data));
    errors.into_result()
}
