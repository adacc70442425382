//! # Multi-Symbol Matching Engine Core
//!
//! A multi-symbol, price-time-priority limit order book and matching engine
//! core for building low-latency trading systems. This crate provides the
//! order matching algorithm, the concurrent per-symbol book structures, and
//! the admission path (worker pool, backpressure, and a bounded trade
//! output channel) around it — not a full exchange, just the core you'd
//! build one on top of.
//!
//! ## Key Features
//!
//! - **Lock-Free Hot Path**: Each side of a book is a [`crossbeam_skiplist::SkipMap`]
//!   of price levels; each price level is a [`dashmap::DashMap`]-indexed FIFO
//!   queue. Matching and cancellation never take a lock on the book itself.
//!
//! - **Order Types**: Market, Limit, Stop, StopLimit, and StopMarket orders,
//!   with Good-Till-Cancelled, Immediate-Or-Cancel, Fill-Or-Kill, and Day
//!   time-in-force policies.
//!
//! - **Bounded Admission**: Orders are admitted through a
//!   [`engine::backpressure::BackpressureManager`] and a fixed-concurrency
//!   [`engine::worker_pool::WorkerPool`], so load sheds under pressure
//!   instead of queuing without bound.
//!
//! - **Observability**: [`engine::stats::EngineStats`] tracks acceptance
//!   latency percentiles via `hdrhistogram`; every layer logs through
//!   `tracing`.
//!
//! ## Status
//!
//! This crate is a matching engine core, not a full exchange: it has no
//! persistence, no network transport, and no clustering. See each module's
//! documentation for its Non-goals.

pub mod engine;
pub mod prelude;
mod utils;

pub use engine::backpressure::{BackpressureManager, BackpressureStats};
pub use engine::book::OrderBook;
pub use engine::book_event::{BookEvent, BookEventListener};
pub use engine::config::EngineConfig;
pub use engine::deadlock_guard::DeadlockGuard;
pub use engine::engine::MatchingEngine;
pub use engine::error::{BookError, EngineError, WorkerPoolError};
pub use engine::fees::FeeSchedule;
pub use engine::order::{Order, OrderId, OrderKind, OrderStatus, Side, TimeInForce};
pub use engine::serialization::{EventSerializer, JsonEventSerializer, SerializationError};
pub use engine::snapshot::{MetricFlags, OrderBookSnapshot, OrderBookSnapshotPackage};
pub use engine::stats::{EngineStats, EngineStatsSnapshot};
pub use engine::trade::{Trade, TradeListener};
pub use engine::validation::{BookLimits, Validator};
pub use engine::worker_pool::{WorkerPool, WorkerPoolStats};
pub use utils::current_time_millis;
