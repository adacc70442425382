/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Parking and triggering of stop, stop-limit, and stop-market orders.
//!
//! A stop order is held here, untouched by the crossing loop, until the
//! book's last trade price traverses its `stop_price`. At that point it is
//! converted to a `Market` or `Limit` order (per its original kind) and
//! handed back to the caller to submit through the normal acceptance path.
//! Exactly one sweep is performed per triggering trade — a stop order
//! triggered by its own sweep's resulting trade does not retrigger within
//! the same call.

use crossbeam_skiplist::SkipMap;
use std::sync::Arc;

use crate::engine::order::{Order, OrderId, OrderKind, Side};

/// Parks buy-side and sell-side stop orders, keyed by trigger price.
pub struct StopBook {
    /// Buy stops: trigger when the last trade price rises to or above the key.
    buy_stops: SkipMap<u128, crossbeam::queue::SegQueue<Arc<Order>>>,
    /// Sell stops: trigger when the last trade price falls to or below the key.
    sell_stops: SkipMap<u128, crossbeam::queue::SegQueue<Arc<Order>>>,
}

impl StopBook {
    /// Creates an empty stop book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buy_stops: SkipMap::new(),
            sell_stops: SkipMap::new(),
        }
    }

    /// Parks a stop order. `order.kind` must be `Stop`, `StopLimit`, or
    /// `StopMarket`.
    pub fn park(&self, order: Arc<Order>) {
        debug_assert!(order.kind.is_stop());
        let book = match order.side {
            Side::Buy => &self.buy_stops,
            Side::Sell => &self.sell_stops,
        };
        let queue = book.get_or_insert_with(order.stop_price, crossbeam::queue::SegQueue::new);
        queue.value().push(order);
    }

    /// Removes a parked order by id and side, if present. Used for explicit
    /// cancellation of a resting stop order before it triggers.
    pub fn remove(&self, order_id: &OrderId, side: Side) -> Option<Arc<Order>> {
        let book = match side {
            Side::Buy => &self.buy_stops,
            Side::Sell => &self.sell_stops,
        };
        for entry in book.iter() {
            let mut found = None;
            let mut kept = Vec::new();
            while let Some(order) = entry.value().pop() {
                if found.is_none() && &order.id == order_id {
                    found = Some(order);
                } else {
                    kept.push(order);
                }
            }
            for order in kept {
                entry.value().push(order);
            }
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Given a new `last_trade_price`, removes and returns every stop order
    /// that has now triggered, converted to its post-trigger kind
    /// (`Stop`/`StopMarket` become `Market`; `StopLimit` becomes `Limit`).
    ///
    /// Each returned order is a fresh clone with `kind` replaced — the
    /// caller re-submits it through the normal acceptance path rather than
    /// this module touching the book directly, keeping this module free of
    /// any dependency on `OrderBook`.
    pub fn triggered(&self, last_trade_price: u128) -> Vec<Arc<Order>> {
        let mut out = Vec::new();
        self.collect_side(&self.buy_stops, last_trade_price, true, &mut out);
        self.collect_side(&self.sell_stops, last_trade_price, false, &mut out);
        out
    }

    fn collect_side(
        &self,
        book: &SkipMap<u128, crossbeam::queue::SegQueue<Arc<Order>>>,
        last_trade_price: u128,
        is_buy: bool,
        out: &mut Vec<Arc<Order>>,
    ) {
        let triggered_keys: Vec<u128> = book
            .iter()
            .filter(|e| {
                if is_buy {
                    *e.key() <= last_trade_price
                } else {
                    *e.key() >= last_trade_price
                }
            })
            .map(|e| *e.key())
            .collect();

        for key in triggered_keys {
            if let Some(entry) = book.get(&key) {
                while let Some(order) = entry.value().pop() {
                    out.push(order);
                }
                entry.remove();
            }
        }
    }

    /// True if no stop orders are parked on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buy_stops.is_empty() && self.sell_stops.is_empty()
    }
}

impl Default for StopBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a triggered stop order's kind into the kind it should be
/// resubmitted as.
#[must_use]
pub fn triggered_kind(original: OrderKind) -> OrderKind {
    match original {
        OrderKind::Stop | OrderKind::StopMarket => OrderKind::Market,
        OrderKind::StopLimit => OrderKind::Limit,
        other => other,
    }
}
