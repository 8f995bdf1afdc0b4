//! Runs one checker lookup per batch group.
//!
//! A single group is looked up inline on the calling task. Several groups are
//! spawned as one task each and joined once all of them finished. A group whose
//! lookup fails (or that finds the call already cancelled) carries the error in
//! its [`GroupOutcome`]; sibling groups are unaffected and nothing is retried.

use super::{BatchGroup, DbChecker, LookupQuery, Membership};
use crate::error::{Result, TermError};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// A group together with its lookup answer.
#[derive(Debug)]
pub struct GroupOutcome {
    /// The executed group
    pub group: BatchGroup,
    /// Membership answer or the lookup failure
    pub result: Result<Membership>,
}

/// Executes all groups and returns their outcomes in group order.
///
/// Spawned lookups are owned by a [`JoinSet`]; dropping the returned future
/// aborts any lookup still in flight.
#[instrument(skip_all, fields(groups = groups.len()))]
pub async fn execute(
    cancel: &CancellationToken,
    checker: &Arc<dyn DbChecker>,
    mut groups: Vec<BatchGroup>,
) -> Vec<GroupOutcome> {
    if groups.len() == 1 {
        if let Some(group) = groups.pop() {
            let result = dispatch(checker.as_ref(), cancel, &group.query).await;
            return vec![GroupOutcome { group, result }];
        }
    }

    let mut tasks = JoinSet::new();
    for (index, group) in groups.iter().enumerate() {
        let checker = Arc::clone(checker);
        let cancel = cancel.clone();
        let query = Arc::clone(&group.query);
        tasks.spawn(async move { (index, dispatch(checker.as_ref(), &cancel, &query).await) });
    }

    let mut results: Vec<Option<Result<Membership>>> = groups.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => warn!(error = %e, "Lookup task failed"),
        }
    }

    groups
        .into_iter()
        .zip(results)
        .map(|(group, result)| {
            let result = result.unwrap_or_else(|| {
                Err(TermError::Internal(format!(
                    "lookup task for '{}' failed",
                    group.query.table
                )))
            });
            GroupOutcome { group, result }
        })
        .collect()
}

async fn dispatch(
    checker: &dyn DbChecker,
    cancel: &CancellationToken,
    query: &LookupQuery,
) -> Result<Membership> {
    if cancel.is_cancelled() {
        debug!(table = %query.table, "Skipping lookup for cancelled call");
        return Err(TermError::Cancelled);
    }
    if query.values.is_empty() {
        return Ok(Membership::new());
    }

    debug!(
        table = %query.table,
        column = %query.column,
        values = query.values.len(),
        conditions = query.conditions.len(),
        "Dispatching existence lookup"
    );
    let result = checker
        .check_exists(
            cancel,
            &query.table,
            &query.column,
            &query.values,
            &query.conditions,
        )
        .await;
    if let Err(e) = &result {
        warn!(table = %query.table, column = %query.column, error = %e, "Existence lookup failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{group_checks, CheckSpec, GroupingMode, InMemoryChecker, Rule};
    use crate::path::FieldPath;
    use crate::pool::Pools;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn groups_for(tables: &[&str]) -> Vec<BatchGroup> {
        let checks = tables.iter().enumerate().map(|(i, table)| {
            CheckSpec::exists(Rule::new(*table, "id"))
                .declare(&FieldPath::parse(&format!("f{i}")), Some(&json!(1)))
                .unwrap()
        });
        group_checks(checks, GroupingMode::Shape, &Pools::disabled())
    }

    fn checker() -> InMemoryChecker {
        InMemoryChecker::new()
            .with_rows("a", vec![json!({"id": 1})])
            .with_rows("b", vec![json!({"id": 2})])
    }

    #[tokio::test]
    async fn test_single_group_inline() {
        let memory = checker();
        let dyn_checker: Arc<dyn DbChecker> = Arc::new(memory.clone());
        let outcomes = execute(&CancellationToken::new(), &dyn_checker, groups_for(&["a"])).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.as_ref().unwrap().contains(&json!(1)));
        assert_eq!(memory.call_count(), 1);
    }

    #[tokio::test]
    async fn test_multiple_groups_keep_order() {
        let memory = checker();
        let dyn_checker: Arc<dyn DbChecker> = Arc::new(memory.clone());
        let outcomes =
            execute(&CancellationToken::new(), &dyn_checker, groups_for(&["a", "b", "c"])).await;
        let tables: Vec<&str> = outcomes.iter().map(|o| o.group.query.table.as_str()).collect();
        assert_eq!(tables, vec!["a", "b", "c"]);
        assert!(outcomes[0].result.as_ref().unwrap().contains(&json!(1)));
        assert!(!outcomes[1].result.as_ref().unwrap().contains(&json!(1)));
        assert_eq!(memory.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_group_does_not_affect_siblings() {
        let memory = checker().failing_table("b");
        let dyn_checker: Arc<dyn DbChecker> = Arc::new(memory);
        let outcomes =
            execute(&CancellationToken::new(), &dyn_checker, groups_for(&["a", "b"])).await;
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(outcomes[1].result, Err(TermError::Checker { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let memory = checker();
        let dyn_checker: Arc<dyn DbChecker> = Arc::new(memory.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        for tables in [&["a"][..], &["a", "b"][..]] {
            let outcomes = execute(&cancel, &dyn_checker, groups_for(tables)).await;
            assert!(outcomes.iter().all(|o| matches!(o.result, Err(TermError::Cancelled))));
        }
        assert_eq!(memory.call_count(), 0);
    }

    #[derive(Debug, Default)]
    struct SlowChecker {
        finished: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl DbChecker for SlowChecker {
        async fn check_exists(
            &self,
            _cancel: &CancellationToken,
            _table: &str,
            _column: &str,
            _values: &[serde_json::Value],
            _conditions: &[crate::checks::WhereClause],
        ) -> Result<Membership> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(Membership::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_execution_aborts_lookups() {
        let finished = Arc::new(AtomicUsize::new(0));
        let dyn_checker: Arc<dyn DbChecker> = Arc::new(SlowChecker {
            finished: Arc::clone(&finished),
        });
        let cancel = CancellationToken::new();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            execute(&cancel, &dyn_checker, groups_for(&["a", "b", "c"])),
        )
        .await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_groups() {
        let dyn_checker: Arc<dyn DbChecker> = Arc::new(checker());
        let outcomes = execute(&CancellationToken::new(), &dyn_checker, Vec::new()).await;
        assert!(outcomes.is_empty());
    }
}
