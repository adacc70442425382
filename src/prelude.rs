/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Prelude module that re-exports commonly used types and traits.
//!
//! This module provides a convenient way to import the most commonly used
//! types, traits, and functions from the crate. Instead of importing each
//! type individually:
//!
//! ```rust
//! use matching_engine::prelude::*;
//! ```

// Core book and engine types
pub use crate::engine::book::OrderBook;
pub use crate::engine::engine::MatchingEngine;
pub use crate::engine::error::{BookError, EngineError, WorkerPoolError};

// Order types and enums
pub use crate::engine::order::{Order, OrderId, OrderKind, OrderStatus, Side, TimeInForce};

// Trade and book-event types
pub use crate::engine::book_event::{BookEvent, BookEventListener};
pub use crate::engine::trade::{Trade, TradeListener};

// Snapshot types
pub use crate::engine::snapshot::{MetricFlags, OrderBookSnapshot, OrderBookSnapshotPackage};

// Fees and validation
pub use crate::engine::fees::FeeSchedule;
pub use crate::engine::validation::{BookLimits, Validator};

// Concurrency primitives
pub use crate::engine::backpressure::{BackpressureManager, BackpressureStats};
pub use crate::engine::deadlock_guard::DeadlockGuard;
pub use crate::engine::worker_pool::{WorkerPool, WorkerPoolStats};

// Configuration and stats
pub use crate::engine::config::EngineConfig;
pub use crate::engine::stats::{EngineStats, EngineStatsSnapshot};

// Serialization
pub use crate::engine::serialization::{EventSerializer, JsonEventSerializer, SerializationError};

// Utility functions
pub use crate::utils::current_time_millis;
