/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Engine-wide configuration.

use serde::{Deserialize, Serialize};

use crate::engine::fees::FeeSchedule;
use crate::engine::validation::BookLimits;

/// Configuration for one [`crate::engine::engine::MatchingEngine`] instance.
///
/// Fee rates and book limits are engine-level rather than per-symbol: every
/// book the engine creates inherits the same schedule and limits. A
/// deployment that genuinely needs per-symbol fee tiers should run one
/// engine instance per tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fee schedule applied to every symbol's book.
    pub fee_schedule: FeeSchedule,
    /// Tick/lot/size limits applied to every symbol's book.
    pub book_limits: BookLimits,
    /// Maximum resting orders per book, across both sides. `None` disables
    /// the cap.
    pub max_book_depth: Option<usize>,
    /// Capacity of the bounded order-submission channel, per symbol.
    pub order_channel_capacity: usize,
    /// Capacity of the bounded trade-event channel, per symbol.
    pub trade_channel_capacity: usize,
    /// Number of worker tasks in the engine's [`crate::engine::worker_pool::WorkerPool`].
    pub worker_pool_size: usize,
    /// Capacity of the worker pool's bounded task queue.
    pub worker_queue_capacity: usize,
    /// Per-task timeout for work submitted to the worker pool, in milliseconds.
    pub worker_task_timeout_ms: u64,
    /// How long a worker above the floor of 1 may sit idle before it exits,
    /// in milliseconds. New workers are spawned back up to
    /// `worker_pool_size` on demand.
    pub worker_idle_timeout_ms: u64,
    /// Load threshold at which [`crate::engine::backpressure::BackpressureManager`]
    /// starts rejecting new admissions.
    pub backpressure_limit: i64,
    /// Timeout for [`crate::engine::deadlock_guard::DeadlockGuard`]-protected
    /// lock acquisitions, in milliseconds.
    pub lock_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_schedule: FeeSchedule::zero_fee(),
            book_limits: BookLimits::default(),
            max_book_depth: None,
            order_channel_capacity: 4096,
            trade_channel_capacity: 4096,
            worker_pool_size: 8,
            worker_queue_capacity: 1024,
            worker_task_timeout_ms: 500,
            worker_idle_timeout_ms: 30_000,
            backpressure_limit: 10_000,
            lock_timeout_ms: 250,
        }
    }
}
