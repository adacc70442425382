/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Trade records and the trade-listener callback.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::order::{OrderId, Side};
use crate::utils::current_time_millis;

/// A single execution produced by the crossing loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Monotonically increasing id, unique within the book that produced it.
    pub trade_id: u64,
    /// Trading symbol.
    pub symbol: String,
    /// Id of the resting (maker) order.
    pub maker_order_id: OrderId,
    /// Id of the aggressing (taker) order.
    pub taker_order_id: OrderId,
    /// Side of the taker order. The maker is necessarily on the opposite side.
    pub taker_side: Side,
    /// Execution price — always the maker's resting price.
    pub price: u128,
    /// Executed quantity.
    pub quantity: u64,
    /// Fee charged to (or rebated to, if negative) the maker side.
    pub maker_fee: i128,
    /// Fee charged to (or rebated to, if negative) the taker side.
    pub taker_fee: i128,
    /// Timestamp at which the trade was produced.
    pub timestamp: u64,
}

impl Trade {
    /// Constructs a new trade with zero fees.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: u64,
        symbol: impl Into<String>,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        taker_side: Side,
        price: u128,
        quantity: u64,
    ) -> Self {
        Self {
            trade_id,
            symbol: symbol.into(),
            maker_order_id,
            taker_order_id,
            taker_side,
            price,
            quantity,
            maker_fee: 0,
            taker_fee: 0,
            timestamp: current_time_millis(),
        }
    }

    /// Returns a copy of this trade with the given fees attached.
    #[must_use]
    pub fn with_fees(mut self, maker_fee: i128, taker_fee: i128) -> Self {
        self.maker_fee = maker_fee;
        self.taker_fee = taker_fee;
        self
    }

    /// Notional value of the trade (`price * quantity`).
    #[must_use]
    pub fn notional(&self) -> i128 {
        self.price as i128 * self.quantity as i128
    }

    /// Combined fees collected across both sides of the trade.
    #[must_use]
    pub fn total_fees(&self) -> i128 {
        self.maker_fee + self.taker_fee
    }
}

/// Callback invoked synchronously whenever the book produces a trade.
///
/// Kept as a plain `Arc<dyn Fn>` rather than an async callback or channel so
/// it can be invoked from inside the crossing loop without an executor
/// hand-off; callers that need to hand trades to an async consumer should
/// have their listener push onto a channel themselves.
pub type TradeListener = Arc<dyn Fn(&Trade) + Send + Sync>;
