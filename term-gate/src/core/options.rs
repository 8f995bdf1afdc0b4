//! Per-call validation options and their serializable configuration.

use crate::checks::{DbChecker, GroupingMode};
use crate::error::{Result, TermError};
use crate::logging::LogConfig;
use crate::pool::{PoolConfig, Pools};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Options for one validation call.
///
/// # Examples
///
/// ```rust
/// use term_gate::checks::InMemoryChecker;
/// use term_gate::core::ValidateOptions;
/// use std::sync::Arc;
///
/// let options = ValidateOptions::new()
///     .with_checker(Arc::new(InMemoryChecker::new()))
///     .abort_early(true);
/// assert!(options.checker().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    abort_early: bool,
    check_on_structural_errors: bool,
    checker: Option<Arc<dyn DbChecker>>,
    cancel: CancellationToken,
    array_workers: usize,
    array_parallel_threshold: usize,
    grouping: GroupingMode,
    log: LogConfig,
    pools: Arc<Pools>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            abort_early: false,
            check_on_structural_errors: false,
            checker: None,
            cancel: CancellationToken::new(),
            array_workers: 1,
            array_parallel_threshold: 256,
            grouping: GroupingMode::default(),
            log: LogConfig::default(),
            pools: Pools::global(),
        }
    }
}

impl ValidateOptions {
    /// Default options: no checker, sequential arrays, global pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from a configuration.
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        config.validate()?;
        let pools = if config.pooling {
            Pools::global()
        } else {
            Arc::new(Pools::disabled())
        };
        Ok(Self {
            abort_early: config.abort_early,
            check_on_structural_errors: config.check_on_structural_errors,
            array_workers: config.array_workers,
            array_parallel_threshold: config.array_parallel_threshold,
            grouping: config.grouping,
            log: LogConfig {
                log_check_details: config.log_check_details,
                max_value_length: config.max_logged_value_length,
            },
            pools,
            ..Self::default()
        })
    }

    /// Stop at the first failing field and skip external checks.
    pub fn abort_early(mut self, enabled: bool) -> Self {
        self.abort_early = enabled;
        self
    }

    /// Run external checks even when structural errors exist.
    pub fn check_on_structural_errors(mut self, enabled: bool) -> Self {
        self.check_on_structural_errors = enabled;
        self
    }

    /// Backing store for exists/unique checks. Without one, declared checks are
    /// skipped.
    pub fn with_checker(mut self, checker: Arc<dyn DbChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Token observed before each lookup dispatch and handed to the checker.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate large arrays on `workers` threads. `1` disables the pool.
    pub fn with_array_workers(mut self, workers: usize, threshold: usize) -> Self {
        self.array_workers = workers.max(1);
        self.array_parallel_threshold = threshold;
        self
    }

    /// How where-values take part in batch grouping.
    pub fn with_grouping(mut self, grouping: GroupingMode) -> Self {
        self.grouping = grouping;
        self
    }

    /// Logging behaviour.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Scratch buffer pools.
    pub fn with_pools(mut self, pools: Arc<Pools>) -> Self {
        self.pools = pools;
        self
    }

    /// Whether abort-early is enabled.
    pub fn is_abort_early(&self) -> bool {
        self.abort_early
    }

    /// Whether external checks run despite structural errors.
    pub fn runs_checks_on_structural_errors(&self) -> bool {
        self.check_on_structural_errors
    }

    /// The configured checker.
    pub fn checker(&self) -> Option<&Arc<dyn DbChecker>> {
        self.checker.as_ref()
    }

    /// The cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Array worker count.
    pub fn array_workers(&self) -> usize {
        self.array_workers
    }

    /// Minimum array length for the worker pool.
    pub fn array_parallel_threshold(&self) -> usize {
        self.array_parallel_threshold
    }

    /// Grouping mode.
    pub fn grouping(&self) -> GroupingMode {
        self.grouping
    }

    /// Logging configuration.
    pub fn log_config(&self) -> &LogConfig {
        &self.log
    }

    /// Scratch pools.
    pub fn pools(&self) -> &Arc<Pools> {
        &self.pools
    }
}

/// Serializable counterpart of [`ValidateOptions`].
///
/// ```rust
/// use term_gate::core::ValidationConfig;
///
/// let config = ValidationConfig::from_json(r#"{"abort_early": true, "array_workers": 4}"#).unwrap();
/// assert!(config.abort_early);
/// assert_eq!(config.array_parallel_threshold, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Stop at the first failing field
    pub abort_early: bool,
    /// Run external checks despite structural errors
    pub check_on_structural_errors: bool,
    /// Worker threads for large arrays
    pub array_workers: usize,
    /// Minimum array length for the worker pool
    pub array_parallel_threshold: usize,
    /// Batch grouping mode
    pub grouping: GroupingMode,
    /// Whether the process-wide buffer pools are used
    pub pooling: bool,
    /// Log every declared check
    pub log_check_details: bool,
    /// Truncation length for logged values
    pub max_logged_value_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            abort_early: false,
            check_on_structural_errors: false,
            array_workers: 1,
            array_parallel_threshold: 256,
            grouping: GroupingMode::Shape,
            pooling: PoolConfig::default().enabled,
            log_check_details: false,
            max_logged_value_length: 256,
        }
    }
}

impl ValidationConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TermError::configuration(format!("invalid validation config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.array_workers == 0 {
            return Err(TermError::configuration("array_workers must be at least 1"));
        }
        if self.max_logged_value_length == 0 {
            return Err(TermError::configuration(
                "max_logged_value_length must be at least 1",
            ));
        }
        Ok(())
    }
}
