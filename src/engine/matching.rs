/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! The crossing loop: matches an incoming taker order against the resting
//! side of the book in strict price-time priority.

use std::sync::Arc;

use crate::engine::book_side::BookSide;
use crate::engine::fees::FeeSchedule;
use crate::engine::order::{Order, OrderId, OrderKind, SequenceGenerator, Side};
use crate::engine::trade::Trade;

/// Result of running the crossing loop once for a single taker order.
pub struct MatchOutcome {
    /// Trades produced, in the order they executed.
    pub trades: Vec<Trade>,
    /// Ids of resting (maker) orders that became fully filled and should be
    /// dropped from the book's id index by the caller.
    pub filled_maker_ids: Vec<OrderId>,
}

/// Returns `true` if a taker at `taker_price` (meaningful only for `Limit`
/// and `StopLimit`-turned-`Limit` orders) is willing to cross `level_price`
/// on `taker_side`.
fn crosses(taker_kind: OrderKind, taker_side: Side, taker_price: u128, level_price: u128) -> bool {
    if taker_kind == OrderKind::Market {
        return true;
    }
    match taker_side {
        Side::Buy => level_price <= taker_price,
        Side::Sell => level_price >= taker_price,
    }
}

/// Walks `resting_side` and fills `taker` against it in price-time priority.
///
/// Stops as soon as the taker is fully filled, the resting side is
/// exhausted, or (for non-market takers) the best remaining resting price no
/// longer crosses the taker's limit. Does not itself decide what happens to
/// any unfilled residual — that is a time-in-force decision made by the
/// caller in `book.rs`.
pub fn cross(
    taker: &Arc<Order>,
    resting_side: &BookSide,
    fee_schedule: &FeeSchedule,
    trade_ids: &SequenceGenerator,
    symbol: &str,
) -> MatchOutcome {
    let mut trades = Vec::new();
    let mut filled_maker_ids = Vec::new();

    'levels: for (level_price, level) in resting_side.levels_in_priority_order() {
        if taker.remaining() == 0 {
            break;
        }
        if !crosses(taker.kind, taker.side, taker.limit_price, level_price) {
            break 'levels;
        }

        loop {
            if taker.remaining() == 0 {
                break 'levels;
            }
            let Some(maker) = level.pop_front_live() else {
                break;
            };
            let trade_qty = taker.remaining().min(maker.remaining());
            if trade_qty == 0 {
                continue;
            }

            maker.record_fill(trade_qty);
            taker.record_fill(trade_qty);
            resting_side.record_fill(&maker.id, trade_qty);

            let notional = level_price as i128 * trade_qty as i128;
            let maker_fee = fee_schedule.calculate_fee(notional, true);
            let taker_fee = fee_schedule.calculate_fee(notional, false);

            let trade = Trade::new(
                trade_ids.next(),
                symbol,
                maker.id.clone(),
                taker.id.clone(),
                taker.side,
                level_price,
                trade_qty,
            )
            .with_fees(maker_fee, taker_fee);
            trades.push(trade);

            if maker.remaining() == 0 {
                filled_maker_ids.push(maker.id.clone());
            } else {
                // Maker retained remaining quantity: it must stay the next
                // order up at this level, ahead of anything already queued
                // behind it, so park it rather than pushing it to the tail.
                level.park_front_residual(maker.clone());
                // A partial fill against a maker with remaining quantity
                // only happens when the taker is now exhausted (price-time
                // priority gives the maker everything the taker has left).
                break 'levels;
            }
        }
    }

    MatchOutcome {
        trades,
        filled_maker_ids,
    }
}

/// Sums the resting quantity available to a taker across every level that
/// would cross, without mutating anything. Used to pre-check Fill-Or-Kill
/// orders: an FOK order is rejected outright, with zero trades, unless this
/// sum already covers its full remaining quantity.
#[must_use]
pub fn available_liquidity(taker_kind: OrderKind, taker_side: Side, taker_price: u128, resting_side: &BookSide) -> u64 {
    let mut total = 0u64;
    for (level_price, level) in resting_side.levels_in_priority_order() {
        if !crosses(taker_kind, taker_side, taker_price, level_price) {
            break;
        }
        total = total.saturating_add(level.total_quantity());
    }
    total
}
