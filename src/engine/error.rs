/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Error types for the order book and the surrounding engine.

use std::fmt;

use crate::engine::order::OrderId;

/// Errors raised by [`crate::engine::book::OrderBook`] operations.
#[derive(Debug, Clone)]
pub enum BookError {
    /// An order with this id is already resting or already known to the book.
    DuplicateOrderId(OrderId),
    /// No order with this id is known to the book.
    OrderNotFound(OrderId),
    /// The order failed a pre-acceptance validation rule.
    ValidationFailed(String),
    /// A limit order's price does not lie on the configured tick size grid.
    InvalidTickSize { price: u128, tick_size: u128 },
    /// An order's quantity does not lie on the configured lot size grid.
    InvalidLotSize { quantity: u64, lot_size: u64 },
    /// An order's quantity falls outside `[min_order_size, max_order_size]`.
    OrderSizeOutOfRange { quantity: u64, min: u64, max: u64 },
    /// A `Fill-Or-Kill` order could not be fully filled and was rejected
    /// with zero trades.
    InsufficientLiquidityForFok,
    /// The book would exceed its configured maximum resting-order depth.
    BookDepthExceeded { max_depth: usize },
    /// An operation was attempted against an order already in a terminal
    /// status; no transition leaves a terminal state.
    OrderAlreadyTerminal(OrderId),
    /// The requested symbol has no book registered for it.
    UnknownSymbol(String),
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::DuplicateOrderId(id) => write!(f, "duplicate order id: {id}"),
            BookError::OrderNotFound(id) => write!(f, "order not found: {id}"),
            BookError::ValidationFailed(reason) => write!(f, "validation failed: {reason}"),
            BookError::InvalidTickSize { price, tick_size } => write!(
                f,
                "price {price} is not a multiple of tick size {tick_size}"
            ),
            BookError::InvalidLotSize { quantity, lot_size } => write!(
                f,
                "quantity {quantity} is not a multiple of lot size {lot_size}"
            ),
            BookError::OrderSizeOutOfRange { quantity, min, max } => write!(
                f,
                "quantity {quantity} is outside the allowed range [{min}, {max}]"
            ),
            BookError::InsufficientLiquidityForFok => {
                write!(f, "insufficient liquidity to fill order completely")
            }
            BookError::BookDepthExceeded { max_depth } => {
                write!(f, "book would exceed maximum depth of {max_depth} resting orders")
            }
            BookError::OrderAlreadyTerminal(id) => {
                write!(f, "order {id} is already in a terminal status")
            }
            BookError::UnknownSymbol(symbol) => write!(f, "unknown symbol: {symbol}"),
        }
    }
}

impl std::error::Error for BookError {}

/// Errors raised by [`crate::engine::engine::MatchingEngine`] admission and
/// lifecycle operations.
#[derive(Debug, Clone)]
pub enum EngineError {
    /// The per-symbol book rejected the operation.
    Book(BookError),
    /// The order channel for this symbol is full; the caller should retry.
    QueueFull { symbol: String },
    /// The engine is not in a state that accepts this operation (e.g.
    /// submitting an order while stopped).
    InvalidEngineState { expected: &'static str, actual: String },
    /// A worker pool task did not complete within its configured timeout.
    Timeout { operation: String, timeout_ms: u64 },
    /// A worker pool task panicked; the panic was caught and converted here.
    WorkerPanicked { message: String },
    /// The backpressure manager rejected the operation under load.
    BackpressureRejected { current_load: i64, limit: i64 },
    /// A lock guarded by [`crate::engine::deadlock_guard::DeadlockGuard`]
    /// could not be acquired before its timeout.
    LockTimeout { name: String, timeout_ms: u64 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Book(e) => write!(f, "{e}"),
            EngineError::QueueFull { symbol } => {
                write!(f, "order queue full for symbol {symbol}")
            }
            EngineError::InvalidEngineState { expected, actual } => write!(
                f,
                "invalid engine state: expected {expected}, was {actual}"
            ),
            EngineError::Timeout { operation, timeout_ms } => {
                write!(f, "operation {operation} timed out after {timeout_ms}ms")
            }
            EngineError::WorkerPanicked { message } => {
                write!(f, "worker task panicked: {message}")
            }
            EngineError::BackpressureRejected { current_load, limit } => write!(
                f,
                "rejected under backpressure: load {current_load} exceeds limit {limit}"
            ),
            EngineError::LockTimeout { name, timeout_ms } => write!(
                f,
                "timed out after {timeout_ms}ms acquiring lock {name}"
            ),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<BookError> for EngineError {
    fn from(e: BookError) -> Self {
        EngineError::Book(e)
    }
}

/// Errors raised while submitting work to a
/// [`crate::engine::worker_pool::WorkerPool`].
#[derive(Debug, Clone)]
pub enum WorkerPoolError {
    /// The bounded task queue is at capacity.
    QueueFull,
    /// The pool has been shut down and no longer accepts work.
    ShuttingDown,
    /// The submitted task exceeded its timeout.
    Timeout { timeout_ms: u64 },
    /// The submitted task panicked.
    Panicked { message: String },
}

impl fmt::Display for WorkerPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerPoolError::QueueFull => write!(f, "worker pool task queue is full"),
            WorkerPoolError::ShuttingDown => write!(f, "worker pool is shutting down"),
            WorkerPoolError::Timeout { timeout_ms } => {
                write!(f, "task timed out after {timeout_ms}ms")
            }
            WorkerPoolError::Panicked { message } => write!(f, "task panicked: {message}"),
        }
    }
}

impl std::error::Error for WorkerPoolError {}

impl From<WorkerPoolError> for EngineError {
    fn from(e: WorkerPoolError) -> Self {
        match e {
            WorkerPoolError::QueueFull => EngineError::BackpressureRejected {
                current_load: -1,
                limit: -1,
            },
            WorkerPoolError::ShuttingDown => EngineError::InvalidEngineState {
                expected: "running",
                actual: "stopped".to_string(),
            },
            WorkerPoolError::Timeout { timeout_ms } => EngineError::Timeout {
                operation: "worker pool task".to_string(),
                timeout_ms,
            },
            WorkerPoolError::Panicked { message } => EngineError::WorkerPanicked { message },
        }
    }
}
