/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Optional book event stream: additions, cancels, matches, and
//! last-trade-price updates, for consumers that want a finer-grained feed
//! than the trade listener alone.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::order::{OrderId, Side};
use crate::utils::current_time_millis;

/// A single book-level event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookEvent {
    /// A new order started resting in the book.
    OrderAdded {
        symbol: String,
        order_id: OrderId,
        side: Side,
        price: u128,
        quantity: u64,
        timestamp: u64,
    },
    /// An order was removed from the book without matching.
    OrderCancelled {
        symbol: String,
        order_id: OrderId,
        timestamp: u64,
    },
    /// An order's resting quantity changed because it matched.
    OrderMatched {
        symbol: String,
        order_id: OrderId,
        filled_quantity: u64,
        remaining_quantity: u64,
        timestamp: u64,
    },
    /// The book's last-trade price changed.
    LastPriceUpdated {
        symbol: String,
        price: u128,
        timestamp: u64,
    },
}

impl BookEvent {
    /// Convenience constructor for [`BookEvent::OrderAdded`], stamping the
    /// current time.
    #[must_use]
    pub fn order_added(
        symbol: impl Into<String>,
        order_id: OrderId,
        side: Side,
        price: u128,
        quantity: u64,
    ) -> Self {
        BookEvent::OrderAdded {
            symbol: symbol.into(),
            order_id,
            side,
            price,
            quantity,
            timestamp: current_time_millis(),
        }
    }

    /// Convenience constructor for [`BookEvent::OrderCancelled`].
    #[must_use]
    pub fn order_cancelled(symbol: impl Into<String>, order_id: OrderId) -> Self {
        BookEvent::OrderCancelled {
            symbol: symbol.into(),
            order_id,
            timestamp: current_time_millis(),
        }
    }

    /// Convenience constructor for [`BookEvent::OrderMatched`].
    #[must_use]
    pub fn order_matched(
        symbol: impl Into<String>,
        order_id: OrderId,
        filled_quantity: u64,
        remaining_quantity: u64,
    ) -> Self {
        BookEvent::OrderMatched {
            symbol: symbol.into(),
            order_id,
            filled_quantity,
            remaining_quantity,
            timestamp: current_time_millis(),
        }
    }

    /// Convenience constructor for [`BookEvent::LastPriceUpdated`].
    #[must_use]
    pub fn last_price_updated(symbol: impl Into<String>, price: u128) -> Self {
        BookEvent::LastPriceUpdated {
            symbol: symbol.into(),
            price,
            timestamp: current_time_millis(),
        }
    }
}

/// Callback invoked synchronously for every [`BookEvent`] the book produces.
pub type BookEventListener = Arc<dyn Fn(&BookEvent) + Send + Sync>;
