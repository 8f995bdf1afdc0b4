//! Deferred existence and uniqueness checks against a backing store.
//!
//! Validators never query a store while the payload is walked. They declare
//! [`DbCheck`]s instead, which are collected for the whole call and then run
//! through a small pipeline:
//!
//! ```text
//! CheckCollector ──► group_checks ──► execute ──► reconcile
//!   (declared)        (BatchGroup)     (one lookup   (field -> messages)
//!                                       per group)
//! ```
//!
//! One lookup is issued per distinct table / column / where-shape, no matter how
//! many fields or array elements reference it.
//!
//! # Example
//!
//! ```rust
//! use term_gate::checks::{where_eq, CheckSpec, Rule};
//!
//! let exists = CheckSpec::exists(Rule::new("categories", "id"));
//! let unique = CheckSpec::unique(
//!     Rule::new("users", "email").with_where(where_eq("tenant_id", 7)),
//! )
//! .ignore("current@example.com")
//! .message("email is taken");
//! # let _ = (exists, unique);
//! ```

use crate::core::Message;
use crate::error::Result;
use crate::path::FieldPath;
use crate::value::{is_scalar, ScalarKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

pub mod collector;
pub mod executor;
pub mod grouper;
pub mod memory;
pub mod reconciler;
pub mod sql;

pub use collector::CheckCollector;
pub use executor::{execute, GroupOutcome};
pub use grouper::{group_checks, BatchGroup, GroupingMode, LookupQuery};
pub use memory::{CheckerCall, InMemoryChecker};
pub use reconciler::reconcile;
pub use sql::{Placeholder, SqlChecker, SqlExecutor};

/// A `(column, operator, value)` condition narrowing a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    /// Column the condition applies to
    pub column: String,
    /// Comparison operator, e.g. `=` or `!=`
    pub operator: String,
    /// Literal compared against
    pub value: Value,
}

/// Equality condition.
pub fn where_eq(column: impl Into<String>, value: impl Into<Value>) -> WhereClause {
    where_op(column, "=", value)
}

/// Inequality condition.
pub fn where_not(column: impl Into<String>, value: impl Into<Value>) -> WhereClause {
    where_op(column, "!=", value)
}

/// Condition with an arbitrary operator.
pub fn where_op(
    column: impl Into<String>,
    operator: impl Into<String>,
    value: impl Into<Value>,
) -> WhereClause {
    WhereClause {
        column: column.into(),
        operator: operator.into(),
        value: value.into(),
    }
}

/// Target of a lookup: table, column and optional conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Table to search
    pub table: String,
    /// Column holding candidate values
    pub column: String,
    /// Additional conditions, in declaration order
    #[serde(default)]
    pub conditions: Vec<WhereClause>,
}

impl Rule {
    /// Creates a rule without conditions.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            conditions: Vec::new(),
        }
    }

    /// Adds a condition.
    pub fn with_where(mut self, clause: WhereClause) -> Self {
        self.conditions.push(clause);
        self
    }
}

/// Whether a value must be present or absent in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// The value must exist
    Exists,
    /// The value must not exist (unless it equals the ignore value)
    Unique,
}

/// One declared lookup requirement for a field value.
#[derive(Debug, Clone)]
pub struct DbCheck {
    /// Path of the field under test
    pub path: FieldPath,
    /// Scalar value under test
    pub value: Value,
    /// Lookup target
    pub rule: Rule,
    /// Exists or unique semantics
    pub kind: CheckKind,
    /// For unique checks, a value that is allowed to exist (the record's own)
    pub ignore: Option<Value>,
    /// Replaces the default failure message
    pub message: Option<Message>,
}

/// An exists/unique requirement attached to a validator, turned into a
/// [`DbCheck`] once the field value is known.
#[derive(Debug, Clone)]
pub struct CheckSpec {
    rule: Rule,
    kind: CheckKind,
    ignore: Option<Value>,
    message: Option<Message>,
}

impl CheckSpec {
    /// The value must exist in `rule`.
    pub fn exists(rule: Rule) -> Self {
        Self {
            rule,
            kind: CheckKind::Exists,
            ignore: None,
            message: None,
        }
    }

    /// The value must not exist in `rule`.
    pub fn unique(rule: Rule) -> Self {
        Self {
            rule,
            kind: CheckKind::Unique,
            ignore: None,
            message: None,
        }
    }

    /// Value that may already exist without failing a unique check.
    pub fn ignore(mut self, value: impl Into<Value>) -> Self {
        self.ignore = Some(value.into()).filter(|v| !v.is_null());
        self
    }

    /// Custom failure message.
    pub fn message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Check semantics.
    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    /// Builds the check for a field value. Non-scalar values declare nothing.
    pub fn declare(&self, path: &FieldPath, value: Option<&Value>) -> Option<DbCheck> {
        let value = value.filter(|v| is_scalar(v))?;
        Some(DbCheck {
            path: path.clone(),
            value: value.clone(),
            rule: self.rule.clone(),
            kind: self.kind,
            ignore: self.ignore.clone(),
            message: self.message.clone(),
        })
    }
}

/// Which candidate values exist, keyed canonically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    found: HashMap<ScalarKey, bool>,
}

impl Membership {
    /// Creates an empty membership answer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records whether `value` exists.
    pub fn insert(&mut self, value: &Value, exists: bool) {
        if let Some(key) = ScalarKey::from_value(value) {
            self.found.insert(key, exists);
        }
    }

    /// Whether `value` was reported as existing.
    pub fn contains(&self, value: &Value) -> bool {
        ScalarKey::from_value(value)
            .and_then(|key| self.found.get(&key).copied())
            .unwrap_or(false)
    }

    /// Number of answered values.
    pub fn len(&self) -> usize {
        self.found.len()
    }

    /// Whether no value was answered.
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

impl<'a> FromIterator<&'a Value> for Membership {
    fn from_iter<I: IntoIterator<Item = &'a Value>>(iter: I) -> Self {
        let mut membership = Membership::new();
        for value in iter {
            membership.insert(value, true);
        }
        membership
    }
}

/// The backing-store capability consumed by term-gate.
///
/// Given a table, a column, candidate values and conditions, report which
/// values exist. Implementations must answer an empty `values` slice with an
/// empty [`Membership`] without touching the store, and should observe `cancel`
/// for in-flight work.
#[async_trait]
pub trait DbChecker: Debug + Send + Sync {
    /// Reports which of `values` exist in `table.column` under `conditions`.
    async fn check_exists(
        &self,
        cancel: &CancellationToken,
        table: &str,
        column: &str,
        values: &[Value],
        conditions: &[WhereClause],
    ) -> Result<Membership>;
}
