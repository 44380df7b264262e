//! Host clock — the source of block times stamped onto invoked calls.
//!
//! Swappable so tests can pin telescope data timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::RuntimeError;

pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now(&self) -> Result<u64, RuntimeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<u64, RuntimeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| RuntimeError::Clock(format!("system time is before UNIX epoch: {}", e)))
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, time: u64) {
        self.time.store(time, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.time.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<u64, RuntimeError> {
        Ok(self.time.load(Ordering::SeqCst))
    }
}
