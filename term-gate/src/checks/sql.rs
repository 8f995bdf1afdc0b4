//! SQL-backed [`DbChecker`].
//!
//! [`SqlChecker`] turns a lookup into a parameterised existence query:
//!
//! ```sql
//! SELECT DISTINCT "id" FROM "products" WHERE "id" IN ($1, $2) AND "tenant_id" = $3
//! ```
//!
//! Identifiers and operators are validated by [`SqlSecurity`]; values are only
//! ever bound as parameters. Running the query is delegated to a
//! [`SqlExecutor`], so any driver can be plugged in.

use super::{DbChecker, Membership, WhereClause};
use crate::error::{Result, TermError};
use crate::security::SqlSecurity;
use crate::value::ScalarKey;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Runs a single-column query for [`SqlChecker`].
#[async_trait]
pub trait SqlExecutor: std::fmt::Debug + Send + Sync {
    /// Executes `sql` with positional `params` and returns the values of the
    /// first result column.
    async fn fetch_column(
        &self,
        cancel: &CancellationToken,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Value>>;
}

/// Positional parameter style of the target database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placeholder {
    /// `$1, $2, ...` (PostgreSQL)
    #[default]
    Dollar,
    /// `?, ?, ...` (MySQL, SQLite)
    Question,
}

/// Existence checker backed by a SQL database.
#[derive(Debug, Clone, Default)]
pub struct SqlChecker {
    executor: Option<Arc<dyn SqlExecutor>>,
    placeholder: Placeholder,
}

impl SqlChecker {
    /// Creates a checker running queries through `executor`.
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            executor: Some(executor),
            placeholder: Placeholder::default(),
        }
    }

    /// A checker without connection; every non-empty lookup fails with
    /// [`TermError::NoConnection`].
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Sets the placeholder style.
    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Builds the existence query and its parameters. Candidate values are
    /// deduplicated by canonical key.
    pub fn build_query(
        &self,
        table: &str,
        column: &str,
        values: &[Value],
        conditions: &[WhereClause],
    ) -> Result<(String, Vec<Value>)> {
        let table_sql = SqlSecurity::escape_identifier(table)?;
        let column_sql = SqlSecurity::escape_identifier(column)?;

        let mut seen = HashSet::new();
        let mut params: Vec<Value> = values
            .iter()
            .filter(|v| ScalarKey::from_value(v).is_some_and(|k| seen.insert(k)))
            .cloned()
            .collect();
        if params.is_empty() {
            return Err(TermError::configuration(
                "existence query needs at least one scalar value",
            ));
        }

        let mut sql =
            format!("SELECT DISTINCT {column_sql} FROM {table_sql} WHERE {column_sql} IN (");
        for i in 0..params.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            self.push_placeholder(&mut sql, i + 1);
        }
        sql.push(')');

        for clause in conditions {
            let column = SqlSecurity::escape_identifier(&clause.column)?;
            let operator = SqlSecurity::sql_operator(&clause.operator)?;
            if clause.value.is_null() {
                match operator {
                    "=" => {
                        let _ = write!(sql, " AND {column} IS NULL");
                        continue;
                    }
                    "<>" => {
                        let _ = write!(sql, " AND {column} IS NOT NULL");
                        continue;
                    }
                    _ => {}
                }
            }
            let _ = write!(sql, " AND {column} {operator} ");
            params.push(clause.value.clone());
            self.push_placeholder(&mut sql, params.len());
        }

        Ok((sql, params))
    }

    fn push_placeholder(&self, sql: &mut String, position: usize) {
        match self.placeholder {
            Placeholder::Dollar => {
                let _ = write!(sql, "${position}");
            }
            Placeholder::Question => sql.push('?'),
        }
    }
}

#[async_trait]
impl DbChecker for SqlChecker {
    #[instrument(
        skip(self, cancel, values, conditions),
        fields(values = values.len(), checker = "sql")
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
        let Some(executor) = &self.executor else {
            return Err(TermError::NoConnection);
        };

        let (sql, params) = self.build_query(table, column, values, conditions)?;
        debug!(sql = %sql, params = params.len(), "Running existence query");
        let rows = executor.fetch_column(cancel, &sql, &params).await?;

        let present: HashSet<ScalarKey> = rows.iter().filter_map(ScalarKey::from_value).collect();
        let mut membership = Membership::new();
        for value in values {
            let exists = ScalarKey::from_value(value).is_some_and(|k| present.contains(&k));
            membership.insert(value, exists);
        }
        Ok(membership)
    }
}
