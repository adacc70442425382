/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Pre-acceptance order validation: the built-in structural rules every
//! order must satisfy, tick/lot/size-range limit checks, and a hook for
//! caller-supplied custom validators.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::error::BookError;
use crate::engine::order::{Order, OrderKind};

/// Per-symbol trading limits enforced before an order is accepted into the
/// book.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BookLimits {
    /// Minimum price increment. `None` disables the check.
    pub tick_size: Option<u128>,
    /// Minimum quantity increment. `None` disables the check.
    pub lot_size: Option<u64>,
    /// Minimum order quantity. `None` disables the check.
    pub min_order_size: Option<u64>,
    /// Maximum order quantity. `None` disables the check.
    pub max_order_size: Option<u64>,
}

/// A custom validation rule, run in addition to the built-in limit checks.
pub type Validator = Arc<dyn Fn(&Order) -> Result<(), BookError> + Send + Sync>;

/// Runs the built-in structural rules every order must satisfy regardless
/// of per-symbol limits: a positive quantity, a non-empty symbol, a
/// positive limit price for `Limit` orders, no price bound on `Market`
/// orders, and a positive stop price for any stop-triggered order.
pub fn check_built_in_rules(order: &Order) -> Result<(), BookError> {
    if order.quantity == 0 {
        return Err(BookError::ValidationFailed(
            "quantity must be greater than zero".to_string(),
        ));
    }
    if order.symbol.is_empty() {
        return Err(BookError::ValidationFailed(
            "symbol must not be empty".to_string(),
        ));
    }
    match order.kind {
        OrderKind::Limit => {
            if order.limit_price == 0 {
                return Err(BookError::ValidationFailed(
                    "limit orders require a price greater than zero".to_string(),
                ));
            }
        }
        OrderKind::Market => {
            if order.limit_price != 0 {
                return Err(BookError::ValidationFailed(
                    "market orders must not carry a limit price".to_string(),
                ));
            }
        }
        OrderKind::Stop | OrderKind::StopLimit | OrderKind::StopMarket => {
            if order.stop_price == 0 {
                return Err(BookError::ValidationFailed(
                    "stop orders require a stop price greater than zero".to_string(),
                ));
            }
            if order.kind == OrderKind::StopLimit && order.limit_price == 0 {
                return Err(BookError::ValidationFailed(
                    "stop-limit orders require a limit price greater than zero".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Runs the built-in tick-size, lot-size, and size-range checks for a limit
/// price order. Market orders (`limit_price == 0`) skip the tick-size check
/// since they carry no price.
pub fn check_limits(order: &Order, limits: &BookLimits) -> Result<(), BookError> {
    if order.kind != crate::engine::order::OrderKind::Market {
        if let Some(tick) = limits.tick_size {
            if tick > 0 && order.limit_price % tick != 0 {
                return Err(BookError::InvalidTickSize {
                    price: order.limit_price,
                    tick_size: tick,
                });
            }
        }
    }
    if let Some(lot) = limits.lot_size {
        if lot > 0 && order.quantity % lot != 0 {
            return Err(BookError::InvalidLotSize {
                quantity: order.quantity,
                lot_size: lot,
            });
        }
    }
    let min = limits.min_order_size.unwrap_or(0);
    let max = limits.max_order_size.unwrap_or(u64::MAX);
    if order.quantity < min || order.quantity > max {
        return Err(BookError::OrderSizeOutOfRange {
            quantity: order.quantity,
            min,
            max,
        });
    }
    Ok(())
}

/// Runs `validators` in order, returning the first failure.
pub fn run_validators(order: &Order, validators: &[Validator]) -> Result<(), BookError> {
    for validator in validators {
        validator(order)?;
    }
    Ok(())
}
