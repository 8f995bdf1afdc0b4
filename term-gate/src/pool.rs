//! Reusable scratch buffers for validation calls.
//!
//! Every call collects a list of declared checks and builds one grouping key per
//! check. [`Pools`] hands those buffers out and takes them back afterwards so a
//! busy service does not allocate them per request. Buffers are cleared before
//! reuse and dropped instead of retained when they grew past
//! [`PoolConfig::max_retained_capacity`]. Pooling never changes results;
//! [`Pools::disabled`] turns it off entirely.

use crate::checks::DbCheck;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

static GLOBAL: Lazy<Arc<Pools>> = Lazy::new(|| Arc::new(Pools::new(PoolConfig::default())));

/// A buffer that can be cleared for reuse.
pub trait Reusable: Default + Send {
    /// Clears contents, keeping the allocation.
    fn reset(&mut self);
    /// Allocated capacity, used for the retention threshold.
    fn capacity(&self) -> usize;
}

impl<T: Send> Reusable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}

impl Reusable for String {
    fn reset(&mut self) {
        self.clear();
    }

    fn capacity(&self) -> usize {
        String::capacity(self)
    }
}

/// Pool sizing.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Whether buffers are retained at all
    pub enabled: bool,
    /// Maximum number of idle buffers kept per pool
    pub max_idle: usize,
    /// Buffers with a larger capacity are dropped instead of retained
    pub max_retained_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_idle: 64,
            max_retained_capacity: 4096,
        }
    }
}

/// A bounded free list of buffers.
#[derive(Debug)]
pub struct BufferPool<T> {
    idle: Mutex<Vec<T>>,
    config: PoolConfig,
}

impl<T: Reusable> BufferPool<T> {
    /// Creates an empty pool.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Takes a cleared buffer, allocating when none is idle.
    pub fn take(&self) -> T {
        if !self.config.enabled {
            return T::default();
        }
        self.idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
            .unwrap_or_default()
    }

    /// Returns a buffer to the pool.
    pub fn give(&self, mut buffer: T) {
        if !self.config.enabled || buffer.capacity() > self.config.max_retained_capacity {
            return;
        }
        buffer.reset();
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        if idle.len() < self.config.max_idle {
            idle.push(buffer);
        }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// The scratch pools used by a validation call.
#[derive(Debug)]
pub struct Pools {
    /// Lists of declared checks
    pub check_lists: BufferPool<Vec<DbCheck>>,
    /// Grouping key buffers
    pub key_buffers: BufferPool<String>,
}

impl Pools {
    /// Creates pools with the given sizing.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            check_lists: BufferPool::new(config),
            key_buffers: BufferPool::new(config),
        }
    }

    /// Pools that never retain anything.
    pub fn disabled() -> Self {
        Self::new(PoolConfig {
            enabled: false,
            ..PoolConfig::default()
        })
    }

    /// The process-wide pools.
    pub fn global() -> Arc<Pools> {
        Arc::clone(&GLOBAL)
    }
}
