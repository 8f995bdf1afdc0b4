//! Property-based tests for term-gate.
//!
//! ## Test Categories
//!
//! ### 1. Batching
//! - The checker receives one call per distinct (table, column, where-shape),
//!   however many fields reference it
//! - Pooling never changes results
//!
//! ### 2. Canonical Keys
//! - Integers, their float form and their textual form compare equal
//!
//! ### 3. Check Semantics
//! - Exists and unique outcomes follow membership and the ignore value

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use term_gate::checks::{CheckSpec, InMemoryChecker, Rule};
use term_gate::core::{Schema, ValidateOptions};
use term_gate::pool::Pools;
use term_gate::validators::NumberValidator;
use term_gate::value::{scalar_eq, ScalarKey};

const TABLES: [&str; 4] = ["users", "teams", "projects", "labels"];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn store() -> InMemoryChecker {
    let mut checker = InMemoryChecker::new();
    for table in TABLES {
        checker = checker.with_rows(table, (0..10).map(|id| json!({"id": id})).collect());
    }
    checker
}

proptest! {
    /// Fields are assigned random tables and values; the number of lookups
    /// equals the number of distinct tables used.
    #[test]
    fn test_one_lookup_per_distinct_target(
        fields in prop::collection::vec((0usize..TABLES.len(), 0i64..20), 1..30)
    ) {
        let mut schema = Schema::new();
        let mut data = Map::new();
        for (i, (table, value)) in fields.iter().enumerate() {
            let name = format!("f{i}");
            schema = schema.field(
                name.clone(),
                NumberValidator::new().exists(Rule::new(TABLES[*table], "id")),
            );
            data.insert(name, json!(value));
        }
        let distinct: HashSet<usize> = fields.iter().map(|(t, _)| *t).collect();
        let invalid = fields.iter().filter(|(_, v)| *v >= 10).count();

        let checker = store();
        let options = ValidateOptions::new().with_checker(Arc::new(checker.clone()));
        let result = runtime().block_on(schema.validate(&data, &options));

        prop_assert_eq!(checker.call_count(), distinct.len());
        match result {
            Ok(()) => prop_assert_eq!(invalid, 0),
            Err(errors) => prop_assert_eq!(errors.len(), invalid),
        }
    }

    #[test]
    fn test_pooling_is_invisible(values in prop::collection::vec(0i64..20, 1..40)) {
        let mut schema = Schema::new();
        let mut data = Map::new();
        for (i, value) in values.iter().enumerate() {
            let name = format!("f{i}");
            schema = schema.field(
                name.clone(),
                NumberValidator::new().exists(Rule::new(TABLES[i % TABLES.len()], "id")),
            );
            data.insert(name, json!(value));
        }

        let rt = runtime();
        let pooled = ValidateOptions::new().with_checker(Arc::new(store()));
        let unpooled = pooled.clone().with_pools(Arc::new(Pools::disabled()));
        prop_assert_eq!(
            rt.block_on(schema.validate(&data, &pooled)),
            rt.block_on(schema.validate(&data, &unpooled))
        );
    }

    #[test]
    fn test_integer_forms_share_a_key(n in -1_000_000i64..1_000_000) {
        let as_int = json!(n);
        let as_text = json!(n.to_string());
        let as_float = json!(n as f64);
        prop_assert_eq!(ScalarKey::from_value(&as_int), ScalarKey::from_value(&as_text));
        prop_assert!(scalar_eq(&as_int, &as_float));
        prop_assert!(scalar_eq(&as_text, &as_int));
        prop_assert!(!scalar_eq(&as_int, &json!([n])));
    }

    #[test]
    fn test_scalar_eq_is_symmetric(a in "[a-z0-9]{0,4}", b in "[a-z0-9]{0,4}") {
        let (a, b) = (Value::String(a), Value::String(b));
        prop_assert_eq!(scalar_eq(&a, &b), scalar_eq(&b, &a));
    }

    /// exists: error iff missing. unique: error iff present and not ignored.
    #[test]
    fn test_check_outcomes(
        value in 0i64..10,
        present in any::<bool>(),
        ignore in prop::option::of(0i64..10),
    ) {
        let rows = if present { vec![json!({"id": value})] } else { Vec::new() };
        let checker = InMemoryChecker::new().with_rows("t", rows);
        let options = ValidateOptions::new().with_checker(Arc::new(checker));

        let mut unique = CheckSpec::unique(Rule::new("t", "id"));
        if let Some(ignore) = ignore {
            unique = unique.ignore(ignore);
        }
        let schema = Schema::new()
            .field("e", NumberValidator::new().exists(Rule::new("t", "id")))
            .field("u", NumberValidator::new().check(unique));
        let mut data = Map::new();
        data.insert("e".into(), json!(value));
        data.insert("u".into(), json!(value));

        let errors = runtime()
            .block_on(schema.validate(&data, &options))
            .err()
            .unwrap_or_default();

        prop_assert_eq!(errors.get("e").is_some(), !present);
        prop_assert_eq!(errors.get("u").is_some(), present && ignore != Some(value));
    }
}
