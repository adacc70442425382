/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! A single price level: a FIFO arrival queue of orders plus an id-indexed
//! map for O(1) lookup and cancellation.
//!
//! Orders are popped off `queue` in arrival order during matching. A
//! cancelled order is left in place in `queue` (removing from the middle of
//! a lock-free FIFO is not cheap) and instead marked `Cancelled` in `orders`;
//! the matching loop skips over ids it pops that are no longer live. This
//! mirrors the dropped dependency's documented preference for an
//! index-plus-queue structure over an intrusive linked list, so cancellation
//! never requires taking a lock on the level.

use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::order::{Order, OrderId, OrderStatus};

/// A resting price level on one side of the book.
pub struct PriceLevel {
    /// The level's price, fixed-point at the symbol's configured scale.
    pub price: u128,
    /// Arrival-ordered queue of order ids. May contain stale ids for orders
    /// that have since been filled or cancelled — consumers must check
    /// `orders` before acting on a popped id.
    queue: SegQueue<OrderId>,
    /// A maker left with remaining quantity after a partial fill. `SegQueue`
    /// has no front-insertion primitive, so a partially-filled maker is held
    /// here instead of being pushed back into `queue`: it must be the next
    /// order `pop_front_live` returns, ahead of anything that arrived after
    /// it, to preserve price-time priority.
    front_residual: Mutex<Option<Arc<Order>>>,
    /// Id-indexed order data for this level.
    orders: DashMap<OrderId, Arc<Order>>,
    /// Sum of `remaining()` across all live orders at this level. Maintained
    /// incrementally so depth queries don't need to walk `orders`.
    total_quantity: AtomicU64,
    /// Count of live (non-terminal) orders at this level.
    order_count: AtomicU64,
}

impl PriceLevel {
    /// Creates an empty price level.
    #[must_use]
    pub fn new(price: u128) -> Self {
        Self {
            price,
            queue: SegQueue::new(),
            front_residual: Mutex::new(None),
            orders: DashMap::new(),
            total_quantity: AtomicU64::new(0),
            order_count: AtomicU64::new(0),
        }
    }

    /// Adds a resting order to the back of the queue.
    pub fn add_order(&self, order: Arc<Order>) {
        let remaining = order.remaining();
        self.queue.push(order.id.clone());
        self.orders.insert(order.id.clone(), order);
        self.total_quantity.fetch_add(remaining, Ordering::AcqRel);
        self.order_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Looks up a live order by id without removing it.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<Arc<Order>> {
        self.orders.get(order_id).map(|r| r.value().clone())
    }

    /// Removes an order from the id index (it is left in `queue` as a stale
    /// entry that matching/iteration will skip). Returns the removed order,
    /// if it was present.
    pub fn remove(&self, order_id: &OrderId) -> Option<Arc<Order>> {
        let removed = self.orders.remove(order_id).map(|(_, v)| v);
        if let Some(order) = &removed {
            self.total_quantity
                .fetch_sub(order.remaining(), Ordering::AcqRel);
            self.order_count.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Records a fill of `qty` against `order_id`, updating level-aggregate
    /// quantity. Caller has already called `order.record_fill`.
    pub fn record_fill(&self, order_id: &OrderId, qty: u64) {
        self.total_quantity.fetch_sub(qty, Ordering::AcqRel);
        if let Some(order) = self.orders.get(order_id) {
            if order.status().is_terminal() {
                drop(order);
                self.orders.remove(order_id);
                self.order_count.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }

    /// Pops the next live order id in arrival order, discarding any stale
    /// entries for orders already removed from `orders`. A maker parked by
    /// `park_front_residual` is returned before anything in `queue` is
    /// considered. Returns `None` once both are exhausted.
    pub fn pop_front_live(&self) -> Option<Arc<Order>> {
        {
            let mut front = self.front_residual.lock().unwrap();
            if let Some(order) = front.take() {
                if !order.status().is_terminal() {
                    return Some(order);
                }
            }
        }
        loop {
            let id = self.queue.pop()?;
            if let Some(order) = self.orders.get(&id) {
                if !order.status().is_terminal() {
                    return Some(order.value().clone());
                }
            }
        }
    }

    /// Parks a maker that was just partially filled back at the front of the
    /// level. It must be the next order matched against, ahead of any order
    /// already sitting in `queue`, to preserve price-time priority — `queue`
    /// itself only supports push-to-back.
    pub fn park_front_residual(&self, order: Arc<Order>) {
        *self.front_residual.lock().unwrap() = Some(order);
    }

    /// Total resting quantity across all live orders.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity.load(Ordering::Acquire)
    }

    /// Count of live resting orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.order_count.load(Ordering::Acquire) as usize
    }

    /// True if no live orders remain at this level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_count() == 0
    }

    /// Returns all live orders in arrival order. Intended for snapshotting
    /// and tests, not the matching hot path — walks a fresh queue so it does
    /// not disturb `self.queue`.
    #[must_use]
    pub fn live_orders_snapshot(&self) -> Vec<Arc<Order>> {
        let mut out = Vec::with_capacity(self.order_count());
        if let Some(order) = self.front_residual.lock().unwrap().clone() {
            if !order.status().is_terminal() {
                out.push(order);
            }
        }
        let drained: Vec<OrderId> = {
            let mut ids = Vec::new();
            while let Some(id) = self.queue.pop() {
                ids.push(id);
            }
            ids
        };
        for id in &drained {
            if let Some(order) = self.orders.get(id) {
                if !order.status().is_terminal() {
                    out.push(order.value().clone());
                }
            }
            self.queue.push(id.clone());
        }
        out
    }
}
