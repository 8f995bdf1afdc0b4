//! Core validation types.
//!
//! ## Overview
//!
//! - **[`Schema`]**: ordered named field validators for one payload object
//! - **[`ValidateOptions`]**: per-call options (checker, cancellation, abort-early, ...)
//! - **[`ValidationContext`]**: path, root and walk state handed to validators
//! - **[`ValidationErrors`]**: field path to messages, the result of a failed call
//! - **[`Message`]**: static or computed failure text for exists/unique checks
//!
//! ## Architecture
//!
//! ```text
//! validate(data, schema, options)
//!     ├── walk: Schema -> Validator::validate -> DeclareChecks
//!     │       (structural errors, collected DbChecks)
//!     └── external checks (when a checker is set and the walk was clean)
//!             group_checks -> execute -> reconcile
//! ```
//!
//! ## Example
//!
//! ```rust
//! use term_gate::core::{Schema, ValidateOptions};
//! use term_gate::validators::{NumberValidator, StringValidator};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let schema = Schema::new()
//!     .field("name", StringValidator::new().required().min_len(2))
//!     .field("age", NumberValidator::new().integer().min(0.0));
//!
//! let data = json!({"name": "A", "age": -1});
//! let errors = schema
//!     .validate(data.as_object().unwrap(), &ValidateOptions::new())
//!     .await
//!     .unwrap_err();
//! assert_eq!(errors.len(), 2);
//! # }
//! ```

mod context;
mod message;
mod options;
mod report;
mod walker;

pub use context::ValidationContext;
pub use message::{Message, MessageContext};
pub use options::{ValidateOptions, ValidationConfig};
pub use report::ValidationErrors;
pub use walker::{validate, validate_field, walk_schema, Schema};
