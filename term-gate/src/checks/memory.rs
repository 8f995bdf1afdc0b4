//! In-memory implementation of [`DbChecker`] for testing and development.

use super::{DbChecker, Membership, WhereClause};
use crate::error::{Result, TermError};
use crate::value::{as_number, ScalarKey};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// A recorded lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerCall {
    /// Table searched
    pub table: String,
    /// Column searched
    pub column: String,
    /// Candidate values as received
    pub values: Vec<Value>,
    /// Conditions as received
    pub conditions: Vec<WhereClause>,
}

/// Table store held in memory.
///
/// Each table is a list of JSON object rows. Every lookup that reaches the
/// store is recorded, which makes the checker useful for asserting how many
/// queries a validation issued. Tables can be configured to fail or to answer
/// slowly.
///
/// # Example
///
/// ```rust
/// use term_gate::checks::InMemoryChecker;
/// use serde_json::json;
///
/// let checker = InMemoryChecker::new()
///     .with_rows("categories", vec![json!({"id": 1}), json!({"id": 2})]);
/// assert_eq!(checker.call_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryChecker {
    tables: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    calls: Arc<Mutex<Vec<CheckerCall>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
}

impl InMemoryChecker {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rows to a table.
    pub fn with_rows(self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        self.insert_rows(table, rows);
        self
    }

    /// Makes every lookup on `table` fail.
    pub fn failing_table(self, table: impl Into<String>) -> Self {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(table.into());
        self
    }

    /// Delays every lookup on `table`.
    pub fn delay_table(self, table: impl Into<String>, delay: Duration) -> Self {
        self.delays
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(table.into(), delay);
        self
    }

    /// Appends rows to a table.
    pub fn insert_rows(&self, table: impl Into<String>, rows: Vec<Value>) {
        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(table.into())
            .or_default()
            .extend(rows);
    }

    /// Lookups received so far.
    pub fn calls(&self) -> Vec<CheckerCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of lookups received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lookup(
        &self,
        table: &str,
        column: &str,
        values: &[Value],
        conditions: &[WhereClause],
    ) -> Result<Membership> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let mut present: HashSet<ScalarKey> = HashSet::new();
        for row in tables.get(table).into_iter().flatten() {
            if !conditions.iter().all(|c| row_matches(row, c)) {
                continue;
            }
            if let Some(key) = row.get(column).and_then(ScalarKey::from_value) {
                present.insert(key);
            }
        }

        let mut membership = Membership::new();
        for value in values {
            let exists = ScalarKey::from_value(value)
                .map(|k| present.contains(&k))
                .unwrap_or(false);
            membership.insert(value, exists);
        }
        Ok(membership)
    }
}

#[async_trait]
impl DbChecker for InMemoryChecker {
    #[instrument(
        skip(self, cancel, values, conditions),
        fields(values = values.len(), checker = "in_memory")
    )]
    async fn check_exists(
        &self,
        cancel: &CancellationToken,
        table: &str,
        column: &str,
        values: &[Value],
        conditions: &[WhereClause],
    ) -> Result<Membership> {
        if values.is_empty() {
            return Ok(Membership::new());
        }

        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(CheckerCall {
                table: table.to_string(),
                column: column.to_string(),
                values: values.to_vec(),
                conditions: conditions.to_vec(),
            });

        let delay = self
            .delays
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(table)
            .copied();
        if let Some(delay) = delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(TermError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if self
            .failing
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(table)
        {
            return Err(TermError::checker(table, "connection refused"));
        }

        self.lookup(table, column, values, conditions)
    }
}

fn row_matches(row: &Value, clause: &WhereClause) -> bool {
    let Some(actual) = row.get(&clause.column) else {
        return false;
    };
    let ordering = compare(actual, &clause.value);
    match clause.operator.as_str() {
        "=" | "==" => ordering == Some(Ordering::Equal),
        "!=" | "<>" => ordering != Some(Ordering::Equal),
        "<" => ordering == Some(Ordering::Less),
        "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        ">" => ordering == Some(Ordering::Greater),
        ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Value::Number(_), _) | (_, Value::Number(_)) = (a, b) {
        if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
            return x.partial_cmp(&y);
        }
    }
    match (ScalarKey::from_value(a), ScalarKey::from_value(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ if a.is_null() && b.is_null() => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{where_eq, where_not, where_op};
    use serde_json::json;

    fn store() -> InMemoryChecker {
        InMemoryChecker::new().with_rows(
            "users",
            vec![
                json!({"id": 1, "email": "a@x.com", "tenant_id": 1, "age": 30}),
                json!({"id": 2, "email": "b@x.com", "tenant_id": 2, "age": 17}),
                json!({"id": "3", "email": "c@x.com", "tenant_id": 1, "age": null}),
            ],
        )
    }

    #[tokio::test]
    async fn test_membership_with_mixed_types() {
        let checker = store();
        let cancel = CancellationToken::new();
        let values = [json!("1"), json!(3), json!(9)];
        let found = checker
            .check_exists(&cancel, "users", "id", &values, &[])
            .await
            .unwrap();
        assert!(found.contains(&json!(1)));
        assert!(found.contains(&json!("3")));
        assert!(!found.contains(&json!(9)));
        assert_eq!(checker.call_count(), 1);
    }

    #[tokio::test]
    async fn test_conditions() {
        let checker = store();
        let cancel = CancellationToken::new();
        let emails = [json!("a@x.com"), json!("b@x.com"), json!("c@x.com")];

        let tenant_one = checker
            .check_exists(&cancel, "users", "email", &emails, &[where_eq("tenant_id", 1)])
            .await
            .unwrap();
        assert!(tenant_one.contains(&json!("a@x.com")));
        assert!(!tenant_one.contains(&json!("b@x.com")));

        let not_tenant_one = checker
            .check_exists(&cancel, "users", "email", &emails, &[where_not("tenant_id", 1)])
            .await
            .unwrap();
        assert!(not_tenant_one.contains(&json!("b@x.com")));

        let adults = checker
            .check_exists(&cancel, "users", "email", &emails, &[where_op("age", ">=", 18)])
            .await
            .unwrap();
        assert!(adults.contains(&json!("a@x.com")));
        assert!(!adults.contains(&json!("b@x.com")));
        assert!(!adults.contains(&json!("c@x.com")));
    }

    #[tokio::test]
    async fn test_empty_values_never_recorded() {
        let checker = store();
        let found = checker
            .check_exists(&CancellationToken::new(), "users", "id", &[], &[])
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(checker.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_table_finds_nothing() {
        let checker = store();
        let found = checker
            .check_exists(&CancellationToken::new(), "missing", "id", &[json!(1)], &[])
            .await
            .unwrap();
        assert!(!found.contains(&json!(1)));
    }

    #[tokio::test]
    async fn test_failing_table() {
        let checker = store().failing_table("users");
        let err = checker
            .check_exists(&CancellationToken::new(), "users", "id", &[json!(1)], &[])
            .await
            .unwrap_err();
        assert_eq!(err, TermError::checker("users", "connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay() {
        let checker = store().delay_table("users", Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let err = checker
            .check_exists(&cancel, "users", "id", &[json!(1)], &[])
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
