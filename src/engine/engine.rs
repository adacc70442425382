/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! The multi-symbol matching engine: owns one [`OrderBook`] per symbol,
//! dispatches admission through a bounded channel and worker pool, and
//! republishes trades on a bounded output channel.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{info, warn};

use crate::engine::book::OrderBook;
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::order::{Order, OrderId, OrderStatus};
use crate::engine::snapshot::{MetricFlags, OrderBookSnapshot};
use crate::engine::stats::{EngineStats, EngineStatsSnapshot};
use crate::engine::trade::Trade;
use crate::engine::worker_pool::WorkerPool;
use crate::engine::backpressure::BackpressureManager;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Stopped = 0,
    Running = 1,
}

impl EngineState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => EngineState::Running,
            _ => EngineState::Stopped,
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Stopped => write!(f, "stopped"),
            EngineState::Running => write!(f, "running"),
        }
    }
}

enum Command {
    Submit {
        symbol: String,
        order: Order,
        reply: oneshot::Sender<Result<Arc<Order>, EngineError>>,
    },
    Cancel {
        symbol: String,
        order_id: OrderId,
        reply: oneshot::Sender<Result<Arc<Order>, EngineError>>,
    },
}

/// A multi-symbol matching engine.
///
/// Each symbol gets its own [`OrderBook`]; books are created lazily on
/// first use of a symbol. Admission runs through a bounded command channel
/// drained by a single background task, which dispatches the actual book
/// mutation onto the engine's [`WorkerPool`] — this keeps all mutation for
/// a given symbol serialized on one logical path while still bounding how
/// much work can be in flight across the whole engine at once.
pub struct MatchingEngine {
    config: EngineConfig,
    books: DashMap<String, Arc<OrderBook>>,
    state: AtomicU8,
    worker_pool: WorkerPool,
    backpressure: BackpressureManager,
    stats: Arc<EngineStats>,
    trade_tx: mpsc::Sender<Trade>,
    command_tx: mpsc::Sender<Command>,
    command_rx: Mutex<Option<mpsc::Receiver<Command>>>,
    dropped_trades: Arc<AtomicU64>,
}

impl MatchingEngine {
    /// Builds a new engine from `config`, returning it alongside the
    /// receiving end of its trade output channel. The engine does not begin
    /// processing admissions until [`MatchingEngine::start`] is called.
    #[must_use]
    pub fn new(config: EngineConfig) -> (Arc<Self>, mpsc::Receiver<Trade>) {
        let (trade_tx, trade_rx) = mpsc::channel(config.trade_channel_capacity);
        let (command_tx, command_rx) = mpsc::channel(config.order_channel_capacity);
        let worker_pool = WorkerPool::new(
            config.worker_pool_size,
            config.worker_queue_capacity,
            Duration::from_millis(config.worker_task_timeout_ms),
            Duration::from_millis(config.worker_idle_timeout_ms),
        );
        let backpressure = BackpressureManager::new(config.backpressure_limit);

        let engine = Arc::new(Self {
            config,
            books: DashMap::new(),
            state: AtomicU8::new(EngineState::Stopped as u8),
            worker_pool,
            backpressure,
            stats: Arc::new(EngineStats::new()),
            trade_tx,
            command_tx,
            command_rx: Mutex::new(Some(command_rx)),
            dropped_trades: Arc::new(AtomicU64::new(0)),
        });
        (engine, trade_rx)
    }

    /// Starts the background admission loop. Returns an error if the engine
    /// is already running.
    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        let mut guard = self.command_rx.lock().await;
        let Some(mut rx) = guard.take() else {
            return Err(EngineError::InvalidEngineState {
                expected: "stopped",
                actual: EngineState::Running.to_string(),
            });
        };
        self.state
            .store(EngineState::Running as u8, Ordering::Release);
        let engine = self.clone();
        tokio::spawn(async move {
            info!("matching engine admission loop started");
            while let Some(command) = rx.recv().await {
                let engine = engine.clone();
                tokio::spawn(async move { engine.handle_command(command).await });
            }
            info!("matching engine admission loop stopped");
        });
        Ok(())
    }

    /// Stops accepting new admissions. In-flight work already dispatched to
    /// the worker pool is allowed to complete.
    pub fn stop(&self) {
        self.state
            .store(EngineState::Stopped as u8, Ordering::Release);
    }

    fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        if self.state() != EngineState::Running {
            return Err(EngineError::InvalidEngineState {
                expected: "running",
                actual: self.state().to_string(),
            });
        }
        Ok(())
    }

    async fn handle_command(self: Arc<Self>, command: Command) {
        match command {
            Command::Submit { symbol, order, reply } => {
                let result = self.process_submit(symbol, order).await;
                let _ = reply.send(result);
            }
            Command::Cancel { symbol, order_id, reply } => {
                let result = self.process_cancel(symbol, order_id).await;
                let _ = reply.send(result);
            }
        }
    }

    async fn process_submit(&self, symbol: String, order: Order) -> Result<Arc<Order>, EngineError> {
        self.backpressure.try_admit().map_err(|load| {
            self.stats.record_rejected();
            EngineError::BackpressureRejected {
                current_load: load,
                limit: self.config.backpressure_limit,
            }
        })?;

        let started = Instant::now();
        let book = self.get_or_create_book(&symbol);
        let outcome = self.worker_pool.submit(move || book.submit_order(order)).await;
        self.backpressure.release();

        match outcome {
            Ok(Ok(accepted)) => {
                let latency_us = started.elapsed().as_micros() as u64;
                if accepted.status() == OrderStatus::Rejected {
                    self.stats.record_rejected();
                } else {
                    self.stats.record_accepted(latency_us);
                }
                Ok(accepted)
            }
            Ok(Err(book_error)) => {
                self.stats.record_rejected();
                Err(EngineError::from(book_error))
            }
            Err(pool_error) => {
                self.stats.record_rejected();
                Err(EngineError::from(pool_error))
            }
        }
    }

    async fn process_cancel(&self, symbol: String, order_id: OrderId) -> Result<Arc<Order>, EngineError> {
        let Some(book) = self.books.get(&symbol).map(|b| b.clone()) else {
            return Err(EngineError::Book(crate::engine::error::BookError::UnknownSymbol(symbol)));
        };
        let outcome = self
            .worker_pool
            .submit(move || book.cancel_order(&order_id))
            .await;
        match outcome {
            Ok(Ok(order)) => Ok(order),
            Ok(Err(book_error)) => Err(EngineError::from(book_error)),
            Err(pool_error) => Err(EngineError::from(pool_error)),
        }
    }

    fn get_or_create_book(&self, symbol: &str) -> Arc<OrderBook> {
        if let Some(existing) = self.books.get(symbol) {
            return existing.clone();
        }
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(self.build_book(symbol)))
            .clone()
    }

    fn build_book(&self, symbol: &str) -> OrderBook {
        let trade_tx = self.trade_tx.clone();
        let symbol_owned = symbol.to_string();
        let dropped_trades = self.dropped_trades.clone();
        let stats = self.stats.clone();
        let mut book = OrderBook::new(symbol, self.config.book_limits, self.config.fee_schedule)
            .with_trade_listener(Arc::new(move |trade: &Trade| {
                stats.record_trades(1, trade.quantity);
                if trade_tx.try_send(trade.clone()).is_err() {
                    dropped_trades.fetch_add(1, Ordering::Relaxed);
                    warn!(symbol = %symbol_owned, "trade channel full, dropping trade event");
                }
            }));
        if let Some(max_depth) = self.config.max_book_depth {
            book = book.with_max_depth(max_depth);
        }
        book
    }

    /// Submits `order` for `symbol` and awaits the acceptance decision.
    pub async fn submit_order(&self, symbol: impl Into<String>, order: Order) -> Result<Arc<Order>, EngineError> {
        self.ensure_running()?;
        let symbol = symbol.into();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .try_send(Command::Submit {
                symbol: symbol.clone(),
                order,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::QueueFull { symbol })?;
        reply_rx.await.map_err(|_| EngineError::InvalidEngineState {
            expected: "running",
            actual: "stopped before reply".to_string(),
        })?
    }

    /// Cancels an order by symbol and id and awaits the result.
    pub async fn cancel_order(&self, symbol: impl Into<String>, order_id: OrderId) -> Result<Arc<Order>, EngineError> {
        self.ensure_running()?;
        let symbol = symbol.into();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .try_send(Command::Cancel {
                symbol: symbol.clone(),
                order_id,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::QueueFull { symbol })?;
        reply_rx.await.map_err(|_| EngineError::InvalidEngineState {
            expected: "running",
            actual: "stopped before reply".to_string(),
        })?
    }

    /// Returns a snapshot of `symbol`'s book, if it has been created.
    #[must_use]
    pub fn snapshot(&self, symbol: &str, flags: MetricFlags) -> Option<OrderBookSnapshot> {
        self.books.get(symbol).map(|book| book.snapshot(flags))
    }

    /// Expires all `Day` orders resting on `symbol`'s book.
    #[must_use]
    pub fn close_session(&self, symbol: &str) -> Vec<Arc<Order>> {
        self.books
            .get(symbol)
            .map(|book| book.close_session())
            .unwrap_or_default()
    }

    /// Lists every symbol with a book currently registered.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.books.iter().map(|e| e.key().clone()).collect()
    }

    /// Snapshot of engine-wide counters and latency percentiles.
    #[must_use]
    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Count of trade events dropped because the output channel was full.
    #[must_use]
    pub fn dropped_trades(&self) -> u64 {
        self.dropped_trades.load(Ordering::Relaxed)
    }
}
