/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Lock-free admission control: tracks in-flight load with plain atomics and
//! rejects new work once it crosses a configured limit, rather than letting
//! queues grow without bound.

use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::utils::current_time_millis;

/// Tracks current load against a configured limit and decides whether new
/// work should be admitted.
pub struct BackpressureManager {
    limit: i64,
    current_load: AtomicI64,
    total_admitted: AtomicU64,
    total_rejected: AtomicU64,
    last_rejection_at: AtomicI64,
}

impl BackpressureManager {
    /// Creates a manager that starts rejecting admissions once
    /// `current_load` would exceed `limit`.
    #[must_use]
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            current_load: AtomicI64::new(0),
            total_admitted: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
            last_rejection_at: AtomicI64::new(0),
        }
    }

    /// Current load, as last recorded by `try_admit`/`release`.
    #[must_use]
    pub fn current_load(&self) -> i64 {
        self.current_load.load(Ordering::Acquire)
    }

    /// Attempts to admit one unit of work. On success, the caller must call
    /// [`BackpressureManager::release`] exactly once when the work
    /// completes. On rejection, load is left unchanged.
    pub fn try_admit(&self) -> Result<(), i64> {
        let load = self.current_load.fetch_add(1, Ordering::AcqRel) + 1;
        if load > self.limit {
            self.current_load.fetch_sub(1, Ordering::AcqRel);
            self.total_rejected.fetch_add(1, Ordering::Relaxed);
            self.last_rejection_at
                .store(current_time_millis() as i64, Ordering::Relaxed);
            return Err(load - 1);
        }
        self.total_admitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Releases one unit of load previously admitted by `try_admit`.
    pub fn release(&self) {
        self.current_load.fetch_sub(1, Ordering::AcqRel);
    }

    /// Runs `f` under admission control: rejects immediately under load,
    /// otherwise admits, runs `f`, and always releases afterward.
    pub fn execute<T>(&self, f: impl FnOnce() -> T) -> Result<T, i64> {
        self.try_admit()?;
        let result = f();
        self.release();
        Ok(result)
    }

    /// Snapshot of the manager's counters.
    #[must_use]
    pub fn stats(&self) -> BackpressureStats {
        BackpressureStats {
            current_load: self.current_load(),
            limit: self.limit,
            total_admitted: self.total_admitted.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
            last_rejection_at: self.last_rejection_at.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a [`BackpressureManager`]'s counters.
#[derive(Debug, Clone, Serialize)]
pub struct BackpressureStats {
    pub current_load: i64,
    pub limit: i64,
    pub total_admitted: u64,
    pub total_rejected: u64,
    pub last_rejection_at: i64,
}
