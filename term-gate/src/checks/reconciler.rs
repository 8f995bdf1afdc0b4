//! Maps lookup answers back onto the checks that asked for them.

use super::{CheckKind, DbCheck, GroupOutcome};
use crate::core::{MessageContext, ValidationErrors};
use crate::value::scalar_eq;
use crate::DataObject;

/// Turns group outcomes into field errors.
///
/// - a failed group adds `database error: <error>` to every field it serves
/// - exists: a value that was not found fails
/// - unique: a value that was found fails, unless it equals the ignore value
pub fn reconcile(outcomes: &[GroupOutcome], root: &DataObject) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for outcome in outcomes {
        match &outcome.result {
            Err(e) => {
                for check in &outcome.group.checks {
                    errors.add(check.path.to_string(), format!("database error: {e}"));
                }
            }
            Ok(membership) => {
                for check in &outcome.group.checks {
                    let found = membership.contains(&check.value);
                    if violates(check, found) {
                        errors.add(check.path.to_string(), failure_message(check, root));
                    }
                }
            }
        }
    }
    errors
}

fn violates(check: &DbCheck, found: bool) -> bool {
    match check.kind {
        CheckKind::Exists => !found,
        CheckKind::Unique => {
            found
                && !check
                    .ignore
                    .as_ref()
                    .is_some_and(|ignore| scalar_eq(ignore, &check.value))
        }
    }
}

fn failure_message(check: &DbCheck, root: &DataObject) -> String {
    if let Some(message) = &check.message {
        return message.render(&MessageContext::new(&check.path, &check.value, root));
    }
    match check.kind {
        CheckKind::Exists => format!("{} does not exist", check.path),
        CheckKind::Unique => format!("{} already exists", check.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{group_checks, CheckSpec, GroupingMode, Membership, Rule};
    use crate::core::Message;
    use crate::error::TermError;
    use crate::path::FieldPath;
    use crate::pool::Pools;
    use serde_json::{json, Map, Value};

    fn outcome(
        specs: Vec<(&str, CheckSpec, Value)>,
        result: crate::error::Result<Membership>,
    ) -> GroupOutcome {
        let checks = specs.into_iter().map(|(path, spec, value)| {
            spec.declare(&FieldPath::parse(path), Some(&value)).unwrap()
        });
        let mut groups = group_checks(checks, GroupingMode::Shape, &Pools::disabled());
        GroupOutcome {
            group: groups.remove(0),
            result,
        }
    }

    fn found(values: &[Value]) -> Membership {
        values.iter().collect()
    }

    #[test]
    fn test_exists_semantics() {
        let rule = Rule::new("categories", "id");
        let o = outcome(
            vec![
                ("a", CheckSpec::exists(rule.clone()), json!(1)),
                ("b", CheckSpec::exists(rule), json!(2)),
            ],
            Ok(found(&[json!(1)])),
        );
        let errors = reconcile(&[o], &Map::new());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("b").unwrap(), &["b does not exist".to_string()]);
    }

    #[test]
    fn test_unique_semantics() {
        let rule = Rule::new("users", "email");
        let o = outcome(
            vec![
                ("taken", CheckSpec::unique(rule.clone()), json!("john@x.com")),
                ("own", CheckSpec::unique(rule.clone()).ignore("john@x.com"), json!("john@x.com")),
                (
                    "other_ignore",
                    CheckSpec::unique(rule.clone()).ignore("jane@x.com"),
                    json!("john@x.com"),
                ),
                ("free", CheckSpec::unique(rule), json!("new@x.com")),
            ],
            Ok(found(&[json!("john@x.com")])),
        );
        let errors = reconcile(&[o], &Map::new());
        assert_eq!(errors.get("taken").unwrap(), &["taken already exists".to_string()]);
        assert!(errors.get("own").is_none());
        assert!(errors.get("other_ignore").is_some());
        assert!(errors.get("free").is_none());
    }

    #[test]
    fn test_ignore_compares_canonically() {
        let o = outcome(
            vec![("id", CheckSpec::unique(Rule::new("t", "id")).ignore("5"), json!(5))],
            Ok(found(&[json!(5)])),
        );
        assert!(!reconcile(&[o], &Map::new()).has_errors());
    }

    #[test]
    fn test_group_error_reaches_every_field() {
        let rule = Rule::new("users", "id");
        let o = outcome(
            vec![
                ("a", CheckSpec::exists(rule.clone()), json!(1)),
                ("b", CheckSpec::unique(rule), json!(2)),
            ],
            Err(TermError::Cancelled),
        );
        let errors = reconcile(&[o], &Map::new());
        assert_eq!(errors.get("a").unwrap(), &["database error: operation cancelled".to_string()]);
        assert_eq!(errors.get("b").unwrap(), &["database error: operation cancelled".to_string()]);
    }

    #[test]
    fn test_custom_message_sees_context() {
        let data = json!({"order": 42});
        let root = data.as_object().unwrap();
        let spec = CheckSpec::exists(Rule::new("products", "id")).message(Message::dynamic(|c| {
            format!(
                "product {} in line {} of order {} is unknown",
                c.value,
                c.index.map(|i| i as i64).unwrap_or(-1),
                c.lookup("order").cloned().unwrap_or_default()
            )
        }));
        let o = outcome(vec![("lines.3.product", spec, json!(9))], Ok(Membership::new()));
        let errors = reconcile(&[o], root);
        assert_eq!(
            errors.get("lines.3.product").unwrap(),
            &["product 9 in line 3 of order 42 is unknown".to_string()]
        );
    }
}
