//! Accumulates declared checks for one validation call.

use super::DbCheck;
use crate::pool::Pools;
use std::sync::Arc;

/// Flat list of checks declared while a payload is walked.
///
/// Collecting never performs I/O. The backing buffer comes from [`Pools`] and is
/// handed back when the collector is dropped.
#[derive(Debug)]
pub struct CheckCollector {
    checks: Vec<DbCheck>,
    pools: Arc<Pools>,
}

impl CheckCollector {
    /// Creates an empty collector backed by a pooled buffer.
    pub fn new(pools: Arc<Pools>) -> Self {
        Self {
            checks: pools.check_lists.take(),
            pools,
        }
    }

    /// Appends one check.
    pub fn push(&mut self, check: DbCheck) {
        self.checks.push(check);
    }

    /// Appends several checks, keeping their order.
    pub fn extend(&mut self, checks: impl IntoIterator<Item = DbCheck>) {
        self.checks.extend(checks);
    }

    /// Moves every check of `other` to the end of this collector.
    pub fn absorb(&mut self, mut other: CheckCollector) {
        self.checks.append(&mut other.checks);
    }

    /// The collected checks, in declaration order.
    pub fn checks(&self) -> &[DbCheck] {
        &self.checks
    }

    /// Removes and yields all checks, keeping the buffer for reuse.
    pub fn drain(&mut self) -> std::vec::Drain<'_, DbCheck> {
        self.checks.drain(..)
    }

    /// Number of collected checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Drop for CheckCollector {
    fn drop(&mut self) {
        self.pools.check_lists.give(std::mem::take(&mut self.checks));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckSpec, Rule};
    use crate::path::FieldPath;
    use crate::pool::PoolConfig;
    use serde_json::json;

    fn check(path: &str, value: i64) -> DbCheck {
        CheckSpec::exists(Rule::new("t", "id"))
            .declare(&FieldPath::parse(path), Some(&json!(value)))
            .unwrap()
    }

    #[test]
    fn test_collects_in_order_and_absorbs() {
        let pools = Arc::new(Pools::disabled());
        let mut outer = CheckCollector::new(Arc::clone(&pools));
        outer.push(check("a", 1));

        let mut inner = CheckCollector::new(Arc::clone(&pools));
        inner.extend([check("b.0", 2), check("b.1", 3)]);
        outer.absorb(inner);

        let paths: Vec<String> = outer.checks().iter().map(|c| c.path.to_string()).collect();
        assert_eq!(paths, vec!["a", "b.0", "b.1"]);
        assert_eq!(outer.drain().count(), 3);
        assert!(outer.is_empty());
    }

    #[test]
    fn test_buffer_returns_to_pool() {
        let pools = Arc::new(Pools::new(PoolConfig::default()));
        {
            let mut collector = CheckCollector::new(Arc::clone(&pools));
            collector.push(check("a", 1));
        }
        assert_eq!(pools.check_lists.idle(), 1);
        let reused = CheckCollector::new(Arc::clone(&pools));
        assert!(reused.is_empty());
        assert_eq!(pools.check_lists.idle(), 0);
    }
}
