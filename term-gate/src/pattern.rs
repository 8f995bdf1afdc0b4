//! Process-wide cache of compiled regular expressions.
//!
//! Schemas are usually built once per request handler, so the same handful of
//! patterns get compiled over and over. The cache keeps one compiled copy per
//! pattern text behind a reader/writer lock: lookups share the read lock and
//! only a miss takes the write lock to compile and insert.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

static GLOBAL: Lazy<Arc<PatternCache>> = Lazy::new(|| Arc::new(PatternCache::new()));

/// Compiled-pattern cache.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: RwLock<HashMap<String, Arc<Regex>>>,
}

impl PatternCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide cache.
    pub fn global() -> Arc<PatternCache> {
        Arc::clone(&GLOBAL)
    }

    /// Returns the compiled pattern, compiling it on a miss.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Regex>, regex::Error> {
        {
            let read = self.compiled.read().unwrap_or_else(|e| e.into_inner());
            if let Some(found) = read.get(pattern) {
                return Ok(Arc::clone(found));
            }
        }

        let mut write = self.compiled.write().unwrap_or_else(|e| e.into_inner());
        // Another writer may have compiled it while we waited.
        if let Some(found) = write.get(pattern) {
            return Ok(Arc::clone(found));
        }
        let regex = Arc::new(Regex::new(pattern)?);
        write.insert(pattern.to_string(), Arc::clone(&regex));
        Ok(regex)
    }

    /// Compiles a pattern for use in a rule. An invalid pattern is logged and
    /// yields `None`, which callers treat as an inert rule.
    pub fn compile_lenient(&self, pattern: &str) -> Option<Arc<Regex>> {
        match self.get_or_compile(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Ignoring invalid pattern rule");
                None
            }
        }
    }

    /// Compiles a pattern known to be valid at build time.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile. This is a configuration bug.
    pub fn compile_trusted(&self, pattern: &str) -> Arc<Regex> {
        match self.get_or_compile(pattern) {
            Ok(regex) => regex,
            Err(e) => panic!("trusted pattern '{pattern}' failed to compile: {e}"),
        }
    }

    /// Number of cached patterns.
    pub fn len(&self) -> usize {
        self.compiled.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
