/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! A single-symbol order book: acceptance, crossing, cancellation, stop-order
//! triggering, and snapshotting.

use crossbeam::atomic::AtomicCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLockWriteGuard;
use tracing::warn;

use crate::engine::book_event::{BookEvent, BookEventListener};
use crate::engine::book_side::BookSide;
use crate::engine::deadlock_guard::DeadlockGuard;
use crate::engine::error::BookError;
use crate::engine::fees::FeeSchedule;
use crate::engine::matching::{self, MatchOutcome};
use crate::engine::order::{Order, OrderId, OrderStatus, SequenceGenerator, Side, TimeInForce};
use crate::engine::snapshot::{MetricFlags, OrderBookSnapshot, PriceLevelSnapshot, SnapshotMetrics};
use crate::engine::stop_orders::{triggered_kind, StopBook};
use crate::engine::trade::{Trade, TradeListener};
use crate::engine::validation::{check_built_in_rules, check_limits, run_validators, BookLimits, Validator};
use crate::utils::current_time_millis;

/// Default acquisition timeout for [`OrderBook::cross_cutting_lock`],
/// matching [`crate::engine::config::EngineConfig::lock_timeout_ms`]'s
/// default.
const CROSS_CUTTING_LOCK_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
enum Location {
    Resting(Side),
    Stop(Side),
}

/// A single symbol's limit order book.
pub struct OrderBook {
    symbol: String,
    bids: BookSide,
    asks: BookSide,
    stop_orders: StopBook,
    /// Tracks where every currently-live (non-terminal) order lives, so
    /// cancellation is O(1) without scanning either side. An id's absence
    /// here means either the id was never accepted or the order reached a
    /// terminal state; `all_orders` disambiguates the two.
    location_index: dashmap::DashMap<OrderId, Location>,
    /// Every order this book has ever accepted past validation, kept for
    /// the lifetime of the book so a duplicate id is rejected even after
    /// the original order terminates, and so cancelling an already-terminal
    /// order reports that distinctly from an unknown id.
    all_orders: dashmap::DashMap<OrderId, Arc<Order>>,
    last_trade_price: AtomicCell<u128>,
    has_traded: AtomicBool,
    max_depth: Option<usize>,
    limits: BookLimits,
    fee_schedule: FeeSchedule,
    validators: Vec<Validator>,
    trade_listener: Option<TradeListener>,
    book_event_listener: Option<BookEventListener>,
    trade_ids: SequenceGenerator,
    snapshot_seq: SequenceGenerator,
    /// Guards the cross-cutting operations that need a consistent view
    /// across both sides and the stop book at once — `snapshot` and
    /// `close_session`. The accept/cancel/cross path never touches this
    /// lock and stays lock-free.
    cross_cutting_lock: DeadlockGuard<()>,
}

impl OrderBook {
    /// Creates an empty book for `symbol`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, limits: BookLimits, fee_schedule: FeeSchedule) -> Self {
        let symbol = symbol.into();
        Self {
            cross_cutting_lock: DeadlockGuard::new(format!("orderbook:{symbol}"), CROSS_CUTTING_LOCK_TIMEOUT, ()),
            symbol,
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            stop_orders: StopBook::new(),
            location_index: dashmap::DashMap::new(),
            all_orders: dashmap::DashMap::new(),
            last_trade_price: AtomicCell::new(0),
            has_traded: AtomicBool::new(false),
            max_depth: None,
            limits,
            fee_schedule,
            validators: Vec::new(),
            trade_listener: None,
            book_event_listener: None,
            trade_ids: SequenceGenerator::new(),
            snapshot_seq: SequenceGenerator::new(),
        }
    }

    /// Caps the number of distinct resting orders this book will hold
    /// across both sides combined.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Registers a callback invoked synchronously for every trade produced.
    #[must_use]
    pub fn with_trade_listener(mut self, listener: TradeListener) -> Self {
        self.trade_listener = Some(listener);
        self
    }

    /// Registers a callback invoked synchronously for every book event.
    #[must_use]
    pub fn with_book_event_listener(mut self, listener: BookEventListener) -> Self {
        self.book_event_listener = Some(listener);
        self
    }

    /// Appends a custom validator to the acceptance pipeline.
    pub fn add_validator(&mut self, validator: Validator) {
        self.validators.push(validator);
    }

    /// Trading symbol this book serves.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn resting_order_count(&self) -> usize {
        self.bids.order_count() + self.asks.order_count()
    }

    fn emit_trade(&self, trade: &Trade) {
        self.last_trade_price.store(trade.price);
        self.has_traded.store(true, Ordering::Release);
        if let Some(listener) = &self.trade_listener {
            listener(trade);
        }
        if let Some(listener) = &self.book_event_listener {
            listener(&BookEvent::last_price_updated(&self.symbol, trade.price));
        }
    }

    fn emit_match_events(&self, order_id: &OrderId, filled: u64, remaining: u64) {
        if let Some(listener) = &self.book_event_listener {
            listener(&BookEvent::order_matched(
                &self.symbol,
                order_id.clone(),
                filled,
                remaining,
            ));
        }
    }

    /// Accepts a new order for processing: validates it, then either parks
    /// it as a stop order, crosses it against the book, or rejects it.
    /// Returns the (possibly already-filled, partially-filled, resting, or
    /// rejected) order on success; returns `Err` only for structural
    /// problems such as a duplicate id.
    pub fn submit_order(&self, mut order: Order) -> Result<Arc<Order>, BookError> {
        if self.all_orders.contains_key(&order.id) {
            return Err(BookError::DuplicateOrderId(order.id));
        }

        if let Err(e) = check_built_in_rules(&order) {
            order.set_status_with_reason(OrderStatus::Rejected, e.to_string());
            return Ok(Arc::new(order));
        }
        if let Err(e) = check_limits(&order, &self.limits) {
            order.set_status_with_reason(OrderStatus::Rejected, e.to_string());
            return Ok(Arc::new(order));
        }
        if let Err(e) = run_validators(&order, &self.validators) {
            order.set_status_with_reason(OrderStatus::Rejected, e.to_string());
            return Ok(Arc::new(order));
        }

        if let Some(max_depth) = self.max_depth {
            if self.resting_order_count() >= max_depth && !order.kind.is_stop() {
                return Err(BookError::BookDepthExceeded { max_depth });
            }
        }

        if order.kind.is_stop() {
            let arc = Arc::new(order);
            self.all_orders.insert(arc.id.clone(), arc.clone());
            self.location_index
                .insert(arc.id.clone(), Location::Stop(arc.side));
            self.stop_orders.park(arc.clone());
            return Ok(arc);
        }

        let arc = Arc::new(order);
        self.all_orders.insert(arc.id.clone(), arc.clone());
        self.process_taker(arc.clone());
        self.sweep_triggered_stops();
        Ok(arc)
    }

    /// Runs the crossing loop for a freshly-accepted (non-stop) taker order
    /// and resolves its residual according to its time-in-force.
    fn process_taker(&self, taker: Arc<Order>) {
        let opposite = self.side(taker.side.opposite());

        if taker.time_in_force == TimeInForce::Fok {
            let liquidity =
                matching::available_liquidity(taker.kind, taker.side, taker.limit_price, opposite);
            if liquidity < taker.remaining() {
                taker.set_status_with_reason(
                    OrderStatus::Cancelled,
                    BookError::InsufficientLiquidityForFok.to_string(),
                );
                return;
            }
        }

        let outcome: MatchOutcome =
            matching::cross(&taker, opposite, &self.fee_schedule, &self.trade_ids, &self.symbol);

        for trade in &outcome.trades {
            self.emit_trade(trade);
        }
        for maker_id in &outcome.filled_maker_ids {
            self.location_index.remove(maker_id);
            self.emit_match_events(maker_id, 0, 0);
        }
        if !outcome.trades.is_empty() {
            self.emit_match_events(&taker.id, taker.filled(), taker.remaining());
        }

        let residual = taker.remaining();
        if residual == 0 {
            return;
        }

        let must_not_rest = taker.kind == crate::engine::order::OrderKind::Market
            || taker.time_in_force == TimeInForce::Ioc
            || taker.time_in_force == TimeInForce::Fok;

        if must_not_rest {
            if taker.kind == crate::engine::order::OrderKind::Market && taker.filled() == 0 {
                taker.set_status_with_reason(OrderStatus::Rejected, "market order found no liquidity");
            } else {
                taker.set_status_with_reason(OrderStatus::Cancelled, "unfilled residual cancelled per time-in-force");
            }
            return;
        }

        self.side(taker.side).insert(taker.clone());
        self.location_index
            .insert(taker.id.clone(), Location::Resting(taker.side));
        if let Some(listener) = &self.book_event_listener {
            listener(&BookEvent::order_added(
                &self.symbol,
                taker.id.clone(),
                taker.side,
                taker.limit_price,
                residual,
            ));
        }
    }

    /// Converts and resubmits any stop orders the most recent trade(s)
    /// triggered. Triggers are collected once per call and not re-checked
    /// against trades produced by their own resubmission, bounding each
    /// submission to a single sweep.
    fn sweep_triggered_stops(&self) {
        if !self.has_traded.load(Ordering::Acquire) {
            return;
        }
        let last_price = self.last_trade_price.load();
        let triggered = self.stop_orders.triggered(last_price);
        for stop in triggered {
            self.location_index.remove(&stop.id);
            let converted = Order::new(
                stop.id.clone(),
                stop.symbol.clone(),
                stop.side,
                triggered_kind(stop.kind),
                stop.limit_price,
                stop.stop_price,
                stop.remaining(),
                stop.time_in_force,
                stop.user_id.clone(),
            );
            let arc = Arc::new(converted);
            self.all_orders.insert(arc.id.clone(), arc.clone());
            self.process_taker(arc);
        }
    }

    /// Cancels a resting or parked-stop order by id. An id that was
    /// accepted but has already reached a terminal state reports
    /// [`BookError::OrderAlreadyTerminal`] rather than
    /// [`BookError::OrderNotFound`], distinguishing "this order already
    /// finished" from "this id was never accepted".
    pub fn cancel_order(&self, order_id: &OrderId) -> Result<Arc<Order>, BookError> {
        if let Some(order) = self.cancel_with_status(order_id, OrderStatus::Cancelled, "cancelled by user") {
            return Ok(order);
        }
        match self.all_orders.get(order_id) {
            Some(order) => Err(BookError::OrderAlreadyTerminal(order.id.clone())),
            None => Err(BookError::OrderNotFound(order_id.clone())),
        }
    }

    fn cancel_with_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        reason: &str,
    ) -> Option<Arc<Order>> {
        let (_, location) = self.location_index.remove(order_id)?;
        match location {
            Location::Resting(side) => {
                let order = self.side(side).remove(order_id)?;
                order.set_status_with_reason(status, reason);
                if let Some(listener) = &self.book_event_listener {
                    listener(&BookEvent::order_cancelled(&self.symbol, order_id.clone()));
                }
                Some(order)
            }
            Location::Stop(side) => {
                let order = self.stop_orders.remove(order_id, side)?;
                order.set_status_with_reason(status, reason);
                Some(order)
            }
        }
    }

    /// Looks up a live (resting or parked-stop) order by id.
    #[must_use]
    pub fn get_order(&self, order_id: &OrderId) -> Option<Arc<Order>> {
        match *self.location_index.get(order_id)?.value() {
            Location::Resting(side) => self.side(side).get(order_id),
            Location::Stop(_) => None,
        }
    }

    /// Acquires the cross-cutting lock for the duration of a snapshot or
    /// session-close sweep. Lock acquisition is polled rather than blocking
    /// indefinitely (see [`DeadlockGuard::blocking_write`]); a timeout is
    /// logged and the operation proceeds without the lock rather than
    /// failing outright, since neither method returns a `Result`.
    fn acquire_cross_cutting_lock(&self) -> Option<RwLockWriteGuard<'_, ()>> {
        match self.cross_cutting_lock.blocking_write() {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "proceeding without the cross-cutting lock");
                None
            }
        }
    }

    /// Expires every resting `Day` order. Intended to be called once at the
    /// end of a trading session; the book has no internal clock of its own.
    pub fn close_session(&self) -> Vec<Arc<Order>> {
        let _guard = self.acquire_cross_cutting_lock();
        let day_ids: Vec<OrderId> = self
            .location_index
            .iter()
            .filter_map(|entry| match *entry.value() {
                Location::Resting(side) => {
                    let order = self.side(side).get(entry.key())?;
                    (order.time_in_force == TimeInForce::Day).then(|| entry.key().clone())
                }
                Location::Stop(_) => None,
            })
            .collect();

        day_ids
            .into_iter()
            .filter_map(|id| self.cancel_with_status(&id, OrderStatus::Expired, "session closed"))
            .collect()
    }

    /// Best (highest) resting bid price.
    #[must_use]
    pub fn best_bid(&self) -> Option<u128> {
        self.bids.best_price()
    }

    /// Best (lowest) resting ask price.
    #[must_use]
    pub fn best_ask(&self) -> Option<u128> {
        self.asks.best_price()
    }

    /// Most recent trade price, if any trade has occurred.
    #[must_use]
    pub fn last_trade_price(&self) -> Option<u128> {
        self.has_traded.load(Ordering::Acquire).then(|| self.last_trade_price.load())
    }

    /// Builds a point-in-time snapshot of both sides of the book.
    #[must_use]
    pub fn snapshot(&self, flags: MetricFlags) -> OrderBookSnapshot {
        let _guard = self.acquire_cross_cutting_lock();
        let bids = self.snapshot_side(&self.bids);
        let asks = self.snapshot_side(&self.asks);

        let best_bid = bids.first().map(|l| l.price);
        let best_ask = asks.first().map(|l| l.price);

        let metrics = SnapshotMetrics {
            mid_price: (flags.contains(MetricFlags::MID_PRICE) && best_bid.is_some() && best_ask.is_some())
                .then(|| (best_bid.unwrap() + best_ask.unwrap()) / 2),
            spread: (flags.contains(MetricFlags::SPREAD) && best_bid.is_some() && best_ask.is_some())
                .then(|| best_ask.unwrap().saturating_sub(best_bid.unwrap())),
            total_bid_depth: flags
                .contains(MetricFlags::DEPTH)
                .then(|| bids.iter().map(|l| l.quantity).sum()),
            total_ask_depth: flags
                .contains(MetricFlags::DEPTH)
                .then(|| asks.iter().map(|l| l.quantity).sum()),
        };

        OrderBookSnapshot {
            symbol: self.symbol.clone(),
            sequence: self.snapshot_seq.next(),
            timestamp: current_time_millis(),
            bids,
            asks,
            last_trade_price: self.last_trade_price(),
            metrics,
        }
    }

    fn snapshot_side(&self, side: &BookSide) -> Vec<PriceLevelSnapshot> {
        side.levels_in_priority_order()
            .map(|(price, level)| PriceLevelSnapshot {
                price,
                quantity: level.total_quantity(),
                order_count: level.order_count(),
            })
            .collect()
    }
}
