//! Validation context passed to every validator.
//!
//! A context knows the payload root, the path of the value being validated, the
//! call options, and the walk state where field errors and declared checks are
//! accumulated. Child contexts are derived by value, so sibling branches never
//! share a path. The walk state is shared by every context of one call unless a
//! context was derived with [`ValidationContext::scratch`].

use super::{ValidateOptions, ValidationErrors};
use crate::checks::{CheckCollector, DbCheck};
use crate::path::{lookup, FieldPath};
use crate::DataObject;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Errors and checks accumulated during one walk.
#[derive(Debug)]
pub(crate) struct WalkState {
    errors: Mutex<ValidationErrors>,
    checks: Mutex<CheckCollector>,
}

impl WalkState {
    fn new(options: &ValidateOptions) -> Self {
        Self {
            errors: Mutex::new(ValidationErrors::new()),
            checks: Mutex::new(CheckCollector::new(Arc::clone(options.pools()))),
        }
    }
}

/// Runtime context for validating one value.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    root: &'a DataObject,
    path: FieldPath,
    options: &'a ValidateOptions,
    state: Arc<WalkState>,
}

impl<'a> ValidationContext<'a> {
    /// Creates the root context of a call.
    pub fn new(root: &'a DataObject, options: &'a ValidateOptions) -> Self {
        Self {
            root,
            path: FieldPath::root(),
            options,
            state: Arc::new(WalkState::new(options)),
        }
    }

    /// Context for a map key below this one.
    pub fn child_key(&self, key: &str) -> Self {
        Self {
            path: self.path.child_key(key),
            ..self.clone()
        }
    }

    /// Context for an array element below this one.
    pub fn child_index(&self, index: usize) -> Self {
        Self {
            path: self.path.child_index(index),
            ..self.clone()
        }
    }

    /// Same position, but with its own empty walk state. Nothing recorded
    /// through it reaches this context until [`absorb`](Self::absorb) is called.
    pub fn scratch(&self) -> Self {
        Self {
            state: Arc::new(WalkState::new(self.options)),
            ..self.clone()
        }
    }

    /// Moves everything recorded in `scratch` into this context's walk state.
    pub fn absorb(&self, scratch: &ValidationContext<'_>) {
        if Arc::ptr_eq(&self.state, &scratch.state) {
            return;
        }
        let errors = std::mem::take(&mut *lock(&scratch.state.errors));
        lock(&self.state.errors).merge(errors);

        let mut taken = lock(&scratch.state.checks);
        let checks: Vec<DbCheck> = taken.drain().collect();
        drop(taken);
        lock(&self.state.checks).extend(checks);
    }

    /// The payload root.
    pub fn root(&self) -> &'a DataObject {
        self.root
    }

    /// Path of the current value.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Call options.
    pub fn options(&self) -> &'a ValidateOptions {
        self.options
    }

    /// Cancellation token of the call.
    pub fn cancellation(&self) -> &CancellationToken {
        self.options.cancellation()
    }

    /// Reads another value of the payload by dotted path.
    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        lookup(self.root, &FieldPath::parse(path))
    }

    /// Records messages for the current path.
    pub fn report(&self, messages: Vec<String>) {
        lock(&self.state.errors).extend_field(self.path.to_string(), messages);
    }

    /// Records declared checks.
    pub fn declare(&self, checks: Vec<DbCheck>) {
        if checks.is_empty() {
            return;
        }
        lock(&self.state.checks).extend(checks);
    }

    /// Whether any error was recorded in this walk state.
    pub fn has_errors(&self) -> bool {
        lock(&self.state.errors).has_errors()
    }

    /// Number of declared checks in this walk state.
    pub fn declared_checks(&self) -> usize {
        lock(&self.state.checks).len()
    }

    /// Takes the recorded errors and checks, leaving the state empty.
    pub(crate) fn take_results(&self) -> (ValidationErrors, CheckCollector) {
        let errors = std::mem::take(&mut *lock(&self.state.errors));
        let checks = std::mem::replace(
            &mut *lock(&self.state.checks),
            CheckCollector::new(Arc::clone(self.options.pools())),
        );
        (errors, checks)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
