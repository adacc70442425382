/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! A named, timeout-bounded read/write lock, for the rare cross-cutting
//! operations (e.g. a consistent snapshot or session-close sweep) that need
//! mutual exclusion instead of relying on the lock-free hot path.
//!
//! The hot accept/cancel path on [`crate::engine::book::OrderBook`] stays
//! lock-free throughout and never touches this type. `OrderBook` does hold
//! one, named after its symbol, guarding the rare cross-cutting operations
//! (snapshot, bulk session close) that need a consistent view across both
//! sides and the stop book at once — see [`DeadlockGuard::blocking_write`].

use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::error::EngineError;

/// Wraps a [`tokio::sync::RwLock`] with a name (for diagnostics) and a
/// default acquisition timeout.
pub struct DeadlockGuard<T> {
    name: String,
    timeout: Duration,
    inner: RwLock<T>,
}

impl<T> DeadlockGuard<T> {
    /// Wraps `value` behind a named lock with `timeout` bounding every
    /// acquisition.
    #[must_use]
    pub fn new(name: impl Into<String>, timeout: Duration, value: T) -> Self {
        Self {
            name: name.into(),
            timeout,
            inner: RwLock::new(value),
        }
    }

    /// Acquires the read lock, failing with [`EngineError::LockTimeout`]
    /// rather than blocking forever if it cannot be acquired within the
    /// configured timeout.
    pub async fn read(&self) -> Result<RwLockReadGuard<'_, T>, EngineError> {
        tokio::time::timeout(self.timeout, self.inner.read())
            .await
            .map_err(|_| EngineError::LockTimeout {
                name: self.name.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })
    }

    /// Acquires the write lock, failing with [`EngineError::LockTimeout`]
    /// rather than blocking forever if it cannot be acquired within the
    /// configured timeout.
    pub async fn write(&self) -> Result<RwLockWriteGuard<'_, T>, EngineError> {
        tokio::time::timeout(self.timeout, self.inner.write())
            .await
            .map_err(|_| EngineError::LockTimeout {
                name: self.name.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })
    }

    /// Synchronous variant of [`DeadlockGuard::read`], for callers that are
    /// not running inside an async task (e.g. `OrderBook`'s plain `fn`
    /// methods). Polls [`tokio::sync::RwLock::try_read`] rather than calling
    /// a blocking tokio API, so it is safe to call from inside a tokio
    /// runtime as well as from plain sync code.
    pub fn blocking_read(&self) -> Result<RwLockReadGuard<'_, T>, EngineError> {
        self.poll_until(|| self.inner.try_read().ok())
    }

    /// Synchronous variant of [`DeadlockGuard::write`]. See
    /// [`DeadlockGuard::blocking_read`] for why this polls instead of
    /// calling a blocking tokio API.
    pub fn blocking_write(&self) -> Result<RwLockWriteGuard<'_, T>, EngineError> {
        self.poll_until(|| self.inner.try_write().ok())
    }

    fn poll_until<'a, G>(&'a self, mut try_acquire: impl FnMut() -> Option<G>) -> Result<G, EngineError> {
        let deadline = std::time::Instant::now() + self.timeout;
        loop {
            if let Some(guard) = try_acquire() {
                return Ok(guard);
            }
            if std::time::Instant::now() >= deadline {
                return Err(EngineError::LockTimeout {
                    name: self.name.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            std::thread::sleep(Duration::from_micros(50));
        }
    }

    /// The diagnostic name this guard was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
