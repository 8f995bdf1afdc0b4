//! # Term Gate - Request Payload Validation with Batched Database Checks
//!
//! Term Gate validates decoded request payloads (JSON objects) against a schema
//! of field validators. Fields that must exist in, or be absent from, a backing
//! store declare `exists`/`unique` checks while the payload is walked; those
//! checks are then grouped and answered with one lookup per distinct target, no
//! matter how many array elements asked for it.
//!
//! ## Quick Start
//!
//! ```rust
//! use term_gate::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let schema = Schema::new()
//!     .field("email", StringValidator::new().required().unique(Rule::new("users", "email")))
//!     .field(
//!         "items",
//!         ArrayValidator::new().min_items(1).of(ObjectValidator::new(
//!             Schema::new().field(
//!                 "product_id",
//!                 NumberValidator::new().required().exists(Rule::new("products", "id")),
//!             ),
//!         )),
//!     );
//!
//! let store = InMemoryChecker::new()
//!     .with_rows("products", vec![json!({"id": 1}), json!({"id": 2})])
//!     .with_rows("users", vec![json!({"email": "taken@example.com"})]);
//! let options = ValidateOptions::new().with_checker(Arc::new(store.clone()));
//!
//! let payload = json!({
//!     "email": "new@example.com",
//!     "items": [{"product_id": 1}, {"product_id": 9}, {"product_id": 2}]
//! });
//! let errors = schema
//!     .validate(payload.as_object().unwrap(), &options)
//!     .await
//!     .unwrap_err();
//!
//! assert_eq!(
//!     errors.get("items.1.product_id").unwrap(),
//!     &["items.1.product_id does not exist".to_string()]
//! );
//! // One lookup for the three product ids, one for the email.
//! assert_eq!(store.call_count(), 2);
//! # }
//! ```
//!
//! ## How a call runs
//!
//! 1. **Walk**: every field validator checks presence, type and its own rules
//!    and records messages under the field path (`items.0.product_id`).
//!    Valid fields with `exists`/`unique` rules declare a [`checks::DbCheck`].
//! 2. **Group**: declared checks with the same table, column and where-shape
//!    are merged into one [`checks::BatchGroup`].
//! 3. **Execute**: each group becomes one [`checks::DbChecker::check_exists`]
//!    call. A single group runs inline, several run concurrently.
//! 4. **Reconcile**: membership answers become field errors in declaration
//!    order; a failed lookup reports `database error: ...` on every field it
//!    served.
//!
//! External checks are skipped when no checker is configured, when the walk
//! produced structural errors (see
//! [`ValidateOptions::check_on_structural_errors`](core::ValidateOptions::check_on_structural_errors)),
//! or under abort-early.
//!
//! ## Architecture
//!
//! - **`core`**: `Schema`, `validate`, options, context and the error report
//! - **`validators`**: string, number, bool, object, array, file, enum,
//!   literal, union and optional validators
//! - **`checks`**: declared checks, grouping, execution, reconciliation and the
//!   in-memory and SQL checkers
//! - **`path`** / **`value`**: dotted field paths and canonical scalar keys
//! - **`pattern`** / **`pool`**: compiled pattern cache and scratch buffer pools
//! - **`security`**: SQL identifier validation for the SQL checker
//! - **`formatters`**: JSON, console and Markdown report rendering
//! - **`logging`**: `tracing` configuration helpers

pub mod checks;
pub mod core;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod path;
pub mod pattern;
pub mod pool;
pub mod prelude;
pub mod security;
pub mod validators;
pub mod value;

/// A decoded payload object: field name to JSON value.
pub type DataObject = serde_json::Map<String, serde_json::Value>;

pub use crate::core::{validate, Schema, ValidateOptions, ValidationErrors};
pub use crate::error::{Result, TermError};
