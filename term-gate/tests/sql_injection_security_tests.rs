//! Security tests for SQL injection prevention in existence queries

use serde_json::json;
use term_gate::checks::{where_eq, where_op, SqlChecker};
use term_gate::security::SqlSecurity;

#[test]
fn test_sql_injection_prevention_drop_table() {
    let checker = SqlChecker::unconfigured();
    let result = checker.build_query("test; DROP TABLE users; --", "id", &[json!(1)], &[]);
    assert!(result.is_err(), "Should reject table name with DROP TABLE");

    let result = checker.build_query("test'; DROP TABLE users; --", "id", &[json!(1)], &[]);
    assert!(result.is_err(), "Should reject table name with DROP TABLE variant");
}

#[test]
fn test_sql_injection_prevention_union_select() {
    let checker = SqlChecker::unconfigured();
    let result = checker.build_query("users", "id UNION SELECT password", &[json!(1)], &[]);
    assert!(result.is_err(), "Should reject column with UNION SELECT");
}

#[test]
fn test_sql_injection_prevention_comments() {
    assert!(SqlSecurity::validate_identifier("test--comment").is_err());
    assert!(SqlSecurity::validate_identifier("test/*comment*/").is_err());
}

#[test]
fn test_sql_injection_prevention_where_clause() {
    let checker = SqlChecker::unconfigured();
    let result = checker.build_query(
        "users",
        "id",
        &[json!(1)],
        &[where_eq("tenant_id = 1 OR 1", 1)],
    );
    assert!(result.is_err(), "Should reject condition column with an expression");

    let result = checker.build_query(
        "users",
        "id",
        &[json!(1)],
        &[where_op("tenant_id", "= 1; --", 1)],
    );
    assert!(result.is_err(), "Should reject operators outside the whitelist");
}

#[test]
fn test_values_are_always_bound() {
    let checker = SqlChecker::unconfigured();
    let (sql, params) = checker
        .build_query(
            "users",
            "email",
            &[json!("x' OR '1'='1")],
            &[where_eq("tenant_id", "1; DROP TABLE users")],
        )
        .unwrap();
    assert!(!sql.contains("OR '1'"));
    assert!(!sql.contains("DROP"));
    assert_eq!(params.len(), 2);
}

#[test]
fn test_valid_identifiers_still_work() {
    for name in ["users", "public.users", "created_at", "deleted_at", "user_updates"] {
        assert!(
            SqlSecurity::validate_identifier(name).is_ok(),
            "{name} should be accepted"
        );
    }
    assert_eq!(
        SqlSecurity::escape_identifier("public.users").unwrap(),
        "\"public\".\"users\""
    );
}
