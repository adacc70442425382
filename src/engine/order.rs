/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Order identity, order kinds, time-in-force, and the order state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::utils::current_time_millis;

/// Side of an order or a resting price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy (bid) side.
    Buy,
    /// Sell (ask) side.
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// The order kind: `Market`, `Limit`, `Stop`, `StopLimit`, `StopMarket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Executes immediately against the opposite side with no price bound.
    Market,
    /// Rests at a limit price once any marketable quantity has crossed.
    Limit,
    /// Parked until `stop_price` is traversed, then becomes a `Market` order.
    Stop,
    /// Parked until `stop_price` is traversed, then becomes a `Limit` order.
    StopLimit,
    /// Alias of `Stop`, kept distinct for wire-format fidelity: `stop` and
    /// `stop_market` are serialized as separate values.
    StopMarket,
}

impl OrderKind {
    /// True for the two kinds that park in a side's stop collection instead
    /// of being dispatched to the crossing loop immediately.
    #[must_use]
    pub fn is_stop(self) -> bool {
        matches!(self, OrderKind::Stop | OrderKind::StopLimit | OrderKind::StopMarket)
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderKind::Market => "market",
            OrderKind::Limit => "limit",
            OrderKind::Stop => "stop",
            OrderKind::StopLimit => "stop_limit",
            OrderKind::StopMarket => "stop_market",
        };
        write!(f, "{s}")
    }
}

/// Time-in-force policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good-Till-Cancelled: rests until explicitly cancelled or session end.
    Gtc,
    /// Immediate-Or-Cancel: any residue after crossing is cancelled.
    Ioc,
    /// Fill-Or-Kill: fills completely or is rejected with zero trades.
    Fok,
    /// Day order: behaves like GTC intraday, expires at session close.
    Day,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
            TimeInForce::Day => "DAY",
        };
        write!(f, "{s}")
    }
}

/// The order state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted, resting or about to match.
    New,
    /// Some quantity matched, residual remains resting.
    PartiallyFilled,
    /// Fully matched. Terminal.
    Filled,
    /// Explicitly cancelled, or unfilled IOC/FOK residue. Terminal.
    Cancelled,
    /// Failed a pre-acceptance validation rule. Terminal.
    Rejected,
    /// TIF=DAY order swept at session close. Terminal.
    Expired,
}

impl OrderStatus {
    /// True for the four states from which no further transition is valid.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "new",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Stable order identifier. Wraps a `String` rather than a `Uuid` directly
/// so producers may supply their own idempotency key — submitting an order
/// whose id already exists is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh random order id.
    #[must_use]
    pub fn new_uuid() -> Self {
        OrderId(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        OrderId(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        OrderId(s)
    }
}

/// Generates monotonically increasing per-process sequence numbers.
///
/// Used for the book's snapshot sequence counter and for trade ids.
#[derive(Debug, Default)]
pub struct SequenceGenerator(AtomicU64);

impl SequenceGenerator {
    /// Creates a new generator starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Returns the next sequence number.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn status_to_u8(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::New => 0,
        OrderStatus::PartiallyFilled => 1,
        OrderStatus::Filled => 2,
        OrderStatus::Cancelled => 3,
        OrderStatus::Rejected => 4,
        OrderStatus::Expired => 5,
    }
}

fn status_from_u8(v: u8) -> OrderStatus {
    match v {
        1 => OrderStatus::PartiallyFilled,
        2 => OrderStatus::Filled,
        3 => OrderStatus::Cancelled,
        4 => OrderStatus::Rejected,
        5 => OrderStatus::Expired,
        _ => OrderStatus::New,
    }
}

/// An order.
///
/// Identity (`id`, `symbol`, `side`, `kind`, `limit_price`, `stop_price`,
/// `quantity`, `time_in_force`, `user_id`, `created_at`) is immutable once
/// constructed. Execution state (`filled`, `status`, `updated_at`,
/// `reject_reason`) is mutated in place behind atomics so the book can
/// update a resting order without taking a lock on the order itself.
#[derive(Debug)]
pub struct Order {
    /// Stable client-facing identifier. Equality of orders is by this id.
    pub id: OrderId,
    /// Optional client-supplied correlation id, carried through the wire
    /// format unchanged.
    pub client_order_id: Option<String>,
    /// Trading symbol.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Market / Limit / Stop / StopLimit / StopMarket.
    pub kind: OrderKind,
    /// Limit price, fixed-point integer at the symbol's configured scale.
    /// Zero only for `Market` orders.
    pub limit_price: u128,
    /// Stop trigger price. Present (non-zero) iff `kind.is_stop()`.
    pub stop_price: u128,
    /// Original requested quantity. Never changes after construction.
    pub quantity: u64,
    /// Cumulative filled quantity. `0 <= filled <= quantity`.
    filled: AtomicU64,
    /// Current status, encoded as `u8` for atomic access.
    status: AtomicU8,
    /// Time-in-force policy.
    pub time_in_force: TimeInForce,
    /// Owning user/account identifier.
    pub user_id: String,
    /// Acceptance timestamp (ms since epoch); also the time-priority
    /// tie-breaker alongside arrival order in the price level's queue.
    pub created_at: u64,
    /// Last mutation timestamp (ms since epoch).
    updated_at: AtomicU64,
    /// Human-readable reason when status is `Rejected` or `Cancelled` for a
    /// documented cause (e.g. "insufficient liquidity").
    reject_reason: std::sync::RwLock<Option<String>>,
}

impl Order {
    /// Constructs a new order in status `New` with zero filled quantity.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        kind: OrderKind,
        limit_price: u128,
        stop_price: u128,
        quantity: u64,
        time_in_force: TimeInForce,
        user_id: impl Into<String>,
    ) -> Self {
        let now = current_time_millis();
        Self {
            id,
            client_order_id: None,
            symbol: symbol.into(),
            side,
            kind,
            limit_price,
            stop_price,
            quantity,
            filled: AtomicU64::new(0),
            status: AtomicU8::new(status_to_u8(OrderStatus::New)),
            time_in_force,
            user_id: user_id.into(),
            created_at: now,
            updated_at: AtomicU64::new(now),
            reject_reason: std::sync::RwLock::new(None),
        }
    }

    /// Cumulative filled quantity.
    pub fn filled(&self) -> u64 {
        self.filled.load(Ordering::Acquire)
    }

    /// Unfilled residual (`quantity - filled`).
    pub fn remaining(&self) -> u64 {
        self.quantity.saturating_sub(self.filled())
    }

    /// Current status.
    pub fn status(&self) -> OrderStatus {
        status_from_u8(self.status.load(Ordering::Acquire))
    }

    /// Last mutation timestamp.
    pub fn updated_at(&self) -> u64 {
        self.updated_at.load(Ordering::Acquire)
    }

    /// Current reject/cancel reason, if any.
    pub fn reject_reason(&self) -> Option<String> {
        self.reject_reason.read().unwrap().clone()
    }

    /// Records `qty` as newly filled. Caller is responsible for not
    /// exceeding `remaining()` — the crossing loop never computes a
    /// `trade_qty` larger than either side's remaining.
    pub(crate) fn record_fill(&self, qty: u64) {
        self.filled.fetch_add(qty, Ordering::AcqRel);
        self.touch();
        if self.remaining() == 0 {
            self.set_status(OrderStatus::Filled);
        } else {
            self.set_status(OrderStatus::PartiallyFilled);
        }
    }

    /// Transitions to `status`, bumping `updated_at`. Does not validate the
    /// transition against the state diagram — callers (the book and engine)
    /// are the only code paths that call this and already enforce it.
    pub(crate) fn set_status(&self, status: OrderStatus) {
        self.status.store(status_to_u8(status), Ordering::Release);
        self.touch();
    }

    /// Sets `status` to `Rejected`/`Cancelled`/`Expired` with a reason.
    pub(crate) fn set_status_with_reason(&self, status: OrderStatus, reason: impl Into<String>) {
        *self.reject_reason.write().unwrap() = Some(reason.into());
        self.set_status(status);
    }

    fn touch(&self) {
        self.updated_at
            .store(current_time_millis(), Ordering::Release);
    }
}
