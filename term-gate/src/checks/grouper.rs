//! Groups declared checks into one lookup per table / column / where-shape.

use super::{DbCheck, WhereClause};
use crate::pool::Pools;
use crate::value::ScalarKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};

const FIELD_SEP: char = '\u{1f}';
const PART_SEP: char = '\u{1e}';

/// How the grouping key treats where-clause values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// Key on table, column and the `(column, operator)` sequence of the
    /// conditions. Checks differing only in where-values share one lookup that
    /// carries the where-values of the first check; mixing different
    /// where-values for the same table and column in one call is unsupported.
    #[default]
    Shape,
    /// Also key on the where-values, so differing values never share a lookup.
    ShapeAndValues,
}

/// The lookup a group sends to the checker.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    /// Table to search
    pub table: String,
    /// Column holding candidate values
    pub column: String,
    /// Conditions of the check that opened the group
    pub conditions: Vec<WhereClause>,
    /// Candidate values, one per check, duplicates kept
    pub values: Vec<Value>,
}

/// The unit of execution: one lookup plus the checks that depend on it.
#[derive(Debug, Clone)]
pub struct BatchGroup {
    /// Grouping key
    pub key: String,
    /// Lookup shared by every check in the group
    pub query: Arc<LookupQuery>,
    /// Checks in declaration order
    pub checks: Vec<DbCheck>,
}

struct PendingGroup {
    key: String,
    query: LookupQuery,
    checks: Vec<DbCheck>,
    warned: bool,
}

/// Groups checks by structural key, keeping first-seen group order.
pub fn group_checks(
    checks: impl IntoIterator<Item = DbCheck>,
    mode: GroupingMode,
    pools: &Pools,
) -> Vec<BatchGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut pending: Vec<PendingGroup> = Vec::new();
    let mut key = pools.key_buffers.take();

    for check in checks {
        key.clear();
        write_key(&mut key, &check, mode);

        match index.get(key.as_str()) {
            Some(&slot) => {
                let group = &mut pending[slot];
                if !group.warned
                    && !same_where_values(&group.query.conditions, &check.rule.conditions)
                {
                    warn!(
                        table = %group.query.table,
                        column = %group.query.column,
                        field = %check.path,
                        "Checks with different where-values share one lookup; using the first check's values"
                    );
                    group.warned = true;
                }
                group.query.values.push(check.value.clone());
                group.checks.push(check);
            }
            None => {
                index.insert(key.clone(), pending.len());
                pending.push(PendingGroup {
                    key: key.clone(),
                    query: LookupQuery {
                        table: check.rule.table.clone(),
                        column: check.rule.column.clone(),
                        conditions: check.rule.conditions.clone(),
                        values: vec![check.value.clone()],
                    },
                    checks: vec![check],
                    warned: false,
                });
            }
        }
    }
    pools.key_buffers.give(key);

    debug!(groups = pending.len(), "Grouped declared checks");
    pending
        .into_iter()
        .map(|p| BatchGroup {
            key: p.key,
            query: Arc::new(p.query),
            checks: p.checks,
        })
        .collect()
}

fn write_key(buf: &mut String, check: &DbCheck, mode: GroupingMode) {
    buf.push_str(&check.rule.table);
    buf.push(FIELD_SEP);
    buf.push_str(&check.rule.column);
    for clause in &check.rule.conditions {
        buf.push(FIELD_SEP);
        buf.push_str(&clause.column);
        buf.push(PART_SEP);
        buf.push_str(&clause.operator);
        if mode == GroupingMode::ShapeAndValues {
            buf.push(PART_SEP);
            match ScalarKey::from_value(&clause.value) {
                Some(k) => buf.push_str(k.as_str()),
                None => {
                    let _ = write!(buf, "{}", clause.value);
                }
            }
        }
    }
}

fn same_where_values(a: &[WhereClause], b: &[WhereClause]) -> bool {
    a.iter().zip(b).all(|(x, y)| {
        match (ScalarKey::from_value(&x.value), ScalarKey::from_value(&y.value)) {
            (Some(kx), Some(ky)) => kx == ky,
            _ => x.value == y.value,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{where_eq, where_op, CheckSpec, Rule};
    use crate::path::FieldPath;
    use serde_json::json;

    fn exists(path: &str, rule: Rule, value: Value) -> DbCheck {
        CheckSpec::exists(rule)
            .declare(&FieldPath::parse(path), Some(&value))
            .unwrap()
    }

    #[test]
    fn test_same_table_column_collapses() {
        let checks =
            (0..5).map(|i| exists(&format!("c{i}"), Rule::new("categories", "id"), json!(i)));
        let groups = group_checks(checks, GroupingMode::Shape, &Pools::disabled());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].checks.len(), 5);
        assert_eq!(groups[0].query.values.len(), 5);
    }

    #[test]
    fn test_duplicate_values_are_kept() {
        let checks = vec![
            exists("a", Rule::new("products", "id"), json!(1)),
            exists("b", Rule::new("products", "id"), json!(1)),
        ];
        let groups = group_checks(checks, GroupingMode::Shape, &Pools::disabled());
        assert_eq!(groups[0].query.values, vec![json!(1), json!(1)]);
    }

    #[test]
    fn test_distinct_tables_columns_and_operators_split() {
        let checks = vec![
            exists("a", Rule::new("users", "id"), json!(1)),
            exists("b", Rule::new("users", "email"), json!("x")),
            exists("c", Rule::new("teams", "id"), json!(1)),
            exists("d", Rule::new("users", "id").with_where(where_eq("active", true)), json!(2)),
            exists(
                "e",
                Rule::new("users", "id").with_where(where_op("active", "!=", true)),
                json!(3),
            ),
        ];
        let groups = group_checks(checks, GroupingMode::Shape, &Pools::disabled());
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[0].checks[0].path.to_string(), "a");
        assert_eq!(groups[4].checks[0].path.to_string(), "e");
    }

    #[test]
    fn test_shape_mode_keeps_first_where_values() {
        let checks = vec![
            exists("a", Rule::new("users", "id").with_where(where_eq("tenant_id", 1)), json!(10)),
            exists("b", Rule::new("users", "id").with_where(where_eq("tenant_id", 2)), json!(11)),
        ];
        let groups = group_checks(checks, GroupingMode::Shape, &Pools::disabled());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].query.conditions[0].value, json!(1));
    }

    #[test]
    fn test_value_mode_splits_on_where_values() {
        let checks = vec![
            exists("a", Rule::new("users", "id").with_where(where_eq("tenant_id", 1)), json!(10)),
            exists("b", Rule::new("users", "id").with_where(where_eq("tenant_id", 2)), json!(11)),
            exists("c", Rule::new("users", "id").with_where(where_eq("tenant_id", "1")), json!(12)),
        ];
        let groups = group_checks(checks, GroupingMode::ShapeAndValues, &Pools::disabled());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].checks.len(), 2);
        assert_eq!(groups[1].query.conditions[0].value, json!(2));
    }

    #[test]
    fn test_empty_input() {
        let groups = group_checks(Vec::new(), GroupingMode::Shape, &Pools::global());
        assert!(groups.is_empty());
    }
}
