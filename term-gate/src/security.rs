//! Identifier and operator hardening for SQL-backed lookups.
//!
//! Table, column and where-clause names reach the [`SqlChecker`] from schema
//! definitions, which may themselves be built from configuration. Everything
//! that is spliced into query text goes through [`SqlSecurity`] first; values
//! are always bound as parameters.
//!
//! [`SqlChecker`]: crate::checks::SqlChecker

use crate::error::{Result, TermError};
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_IDENTIFIER_LEN: usize = 128;

const RESERVED_WORDS: &[&str] = &[
    "union", "select", "insert", "update", "delete", "drop", "create", "alter", "exec",
    "execute", "declare", "truncate", "grant", "revoke",
];

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and escapes a SQL identifier (table name, column name, etc.).
    ///
    /// # Examples
    /// ```rust
    /// use term_gate::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("users").unwrap(), "\"users\"");
    /// assert_eq!(
    ///     SqlSecurity::escape_identifier("auth.users").unwrap(),
    ///     "\"auth\".\"users\""
    /// );
    /// assert!(SqlSecurity::escape_identifier("id; DROP TABLE users--").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        Ok(identifier
            .split('.')
            .map(|part| format!("\"{part}\""))
            .collect::<Vec<_>>()
            .join("."))
    }

    /// Validates a SQL identifier without escaping it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(TermError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LEN {
            return Err(TermError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LEN} characters)"
            )));
        }

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            // Letters, digits and underscores; dots separate qualified names.
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(TermError::SecurityError(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, underscores, and dots"
            )));
        }

        Self::check_reserved_words(identifier)
    }

    /// Maps a where-clause operator onto its SQL spelling.
    ///
    /// Only plain comparison operators are accepted.
    pub fn sql_operator(operator: &str) -> Result<&'static str> {
        match operator.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Ok("="),
            "!=" | "<>" => Ok("<>"),
            "<" => Ok("<"),
            "<=" => Ok("<="),
            ">" => Ok(">"),
            ">=" => Ok(">="),
            "like" => Ok("LIKE"),
            "not like" => Ok("NOT LIKE"),
            other => Err(TermError::SecurityError(format!(
                "Unsupported where-clause operator: '{other}'"
            ))),
        }
    }

    /// Rejects identifiers whose underscore/dot separated words are SQL keywords.
    fn check_reserved_words(identifier: &str) -> Result<()> {
        let lower = identifier.to_ascii_lowercase();
        for word in lower.split(['.', '_']) {
            if RESERVED_WORDS.contains(&word) {
                return Err(TermError::SecurityError(format!(
                    "SQL identifier contains dangerous pattern: '{word}'"
                )));
            }
        }
        if lower.starts_with("xp_") || lower.starts_with("sp_") {
            return Err(TermError::SecurityError(
                "SQL identifier looks like a system procedure".to_string(),
            ));
        }
        Ok(())
    }
}
