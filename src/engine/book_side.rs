/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! One side (bids or asks) of an order book: a price-ordered skip list of
//! [`PriceLevel`]s plus an id-indexed map for O(1) order location.

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use std::sync::Arc;

use crate::engine::order::{Order, OrderId, Side};
use crate::engine::price_level::PriceLevel;

/// One side of an order book.
///
/// Levels are always stored in ascending price order in the underlying
/// `SkipMap`; which end is "best" depends on `side` (best bid is the
/// highest price, best ask is the lowest), so callers use [`BookSide::best`]
/// rather than reading an end of the map directly.
pub struct BookSide {
    side: Side,
    levels: SkipMap<u128, Arc<PriceLevel>>,
    /// Maps a resting order id to the price it rests at, so cancellation
    /// does not need to scan every level.
    locations: DashMap<OrderId, u128>,
}

impl BookSide {
    /// Creates an empty side.
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: SkipMap::new(),
            locations: DashMap::new(),
        }
    }

    /// Inserts `order` as a new resting order at its limit price, creating
    /// the price level if one does not already exist.
    pub fn insert(&self, order: Arc<Order>) {
        let price = order.limit_price;
        let level = self
            .levels
            .get_or_insert_with(price, || Arc::new(PriceLevel::new(price)));
        level.value().add_order(order.clone());
        self.locations.insert(order.id.clone(), price);
    }

    /// Removes an order by id, pruning its price level if it becomes empty.
    /// Returns the removed order, if it was resting on this side.
    pub fn remove(&self, order_id: &OrderId) -> Option<Arc<Order>> {
        let (_, price) = self.locations.remove(order_id)?;
        let level_entry = self.levels.get(&price)?;
        let removed = level_entry.value().remove(order_id);
        if level_entry.value().is_empty() {
            level_entry.remove();
        }
        removed
    }

    /// Records a fill against a resting order, pruning the level if it
    /// becomes empty as a result.
    pub fn record_fill(&self, order_id: &OrderId, qty: u64) {
        let Some(price) = self.locations.get(order_id).map(|r| *r.value()) else {
            return;
        };
        let Some(level_entry) = self.levels.get(&price) else {
            return;
        };
        level_entry.value().record_fill(order_id, qty);
        if level_entry.value().is_empty() {
            self.locations.remove(order_id);
            level_entry.remove();
        }
    }

    /// Looks up an order by id without removing it.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<Arc<Order>> {
        let price = *self.locations.get(order_id)?.value();
        self.levels.get(&price)?.value().get(order_id)
    }

    /// The best (highest-priority) price on this side, if any orders rest.
    #[must_use]
    pub fn best_price(&self) -> Option<u128> {
        match self.side {
            Side::Buy => self.levels.back().map(|e| *e.key()),
            Side::Sell => self.levels.front().map(|e| *e.key()),
        }
    }

    /// The best price level, if any orders rest.
    #[must_use]
    pub fn best_level(&self) -> Option<Arc<PriceLevel>> {
        match self.side {
            Side::Buy => self.levels.back().map(|e| e.value().clone()),
            Side::Sell => self.levels.front().map(|e| e.value().clone()),
        }
    }

    /// Returns the price level at `price`, if one exists.
    #[must_use]
    pub fn level_at(&self, price: u128) -> Option<Arc<PriceLevel>> {
        self.levels.get(&price).map(|e| e.value().clone())
    }

    /// Iterates price levels in matching priority order: best price first.
    /// For the bid side this is descending price; for the ask side,
    /// ascending. Used by the crossing loop to walk the resting side of the
    /// book against an incoming taker.
    pub fn levels_in_priority_order(&self) -> Box<dyn Iterator<Item = (u128, Arc<PriceLevel>)> + '_> {
        match self.side {
            Side::Buy => Box::new(
                self.levels
                    .iter()
                    .rev()
                    .map(|e| (*e.key(), e.value().clone())),
            ),
            Side::Sell => Box::new(self.levels.iter().map(|e| (*e.key(), e.value().clone()))),
        }
    }

    /// Number of distinct price levels with at least one resting order.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Total number of resting orders across all levels on this side.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.locations.len()
    }

    /// True if no orders rest on this side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
