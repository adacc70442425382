use matching_engine::prelude::*;

fn limit(id: &str, side: Side, price: u128, qty: u64, tif: TimeInForce) -> Order {
    Order::new(
        OrderId::from(id),
        "BTC/USD",
        side,
        OrderKind::Limit,
        price,
        0,
        qty,
        tif,
        "user-1",
    )
}

fn market(id: &str, side: Side, qty: u64) -> Order {
    Order::new(
        OrderId::from(id),
        "BTC/USD",
        side,
        OrderKind::Market,
        0,
        0,
        qty,
        TimeInForce::Ioc,
        "user-1",
    )
}

fn book() -> OrderBook {
    OrderBook::new("BTC/USD", BookLimits::default(), FeeSchedule::zero_fee())
}

#[test]
fn simple_match_fills_both_sides_completely() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 10, TimeInForce::Gtc))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 10, TimeInForce::Gtc))
        .unwrap();
    assert_eq!(taker.status(), OrderStatus::Filled);
    assert_eq!(taker.filled(), 10);
    assert!(book.best_bid().is_none());
    assert!(book.best_ask().is_none());
}

#[test]
fn price_time_priority_across_three_resting_orders() {
    let book = book();
    book.submit_order(limit("m1", Side::Sell, 100, 3, TimeInForce::Gtc))
        .unwrap();
    book.submit_order(limit("m2", Side::Sell, 100, 3, TimeInForce::Gtc))
        .unwrap();
    book.submit_order(limit("m3", Side::Sell, 99, 3, TimeInForce::Gtc))
        .unwrap();

    // Best price (99) fills first even though it arrived last.
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 3, TimeInForce::Gtc))
        .unwrap();
    assert_eq!(taker.filled(), 3);
    assert_eq!(book.best_ask(), Some(100));
}

#[test]
fn partial_fill_leaves_correct_residual_on_both_sides() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 10, TimeInForce::Gtc))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 4, TimeInForce::Gtc))
        .unwrap();
    assert_eq!(taker.status(), OrderStatus::Filled);
    let snap = book.snapshot(MetricFlags::ALL);
    assert_eq!(snap.asks[0].quantity, 6);
}

#[test]
fn market_order_sweeps_multiple_price_levels() {
    let book = book();
    book.submit_order(limit("m1", Side::Sell, 100, 5, TimeInForce::Gtc))
        .unwrap();
    book.submit_order(limit("m2", Side::Sell, 101, 5, TimeInForce::Gtc))
        .unwrap();
    book.submit_order(limit("m3", Side::Sell, 102, 5, TimeInForce::Gtc))
        .unwrap();

    let taker = book.submit_order(market("taker", Side::Buy, 12)).unwrap();
    assert_eq!(taker.status(), OrderStatus::Filled);
    assert_eq!(book.best_ask(), Some(102));
    assert_eq!(book.snapshot(MetricFlags::empty()).asks[0].quantity, 3);
}

#[test]
fn market_order_with_no_liquidity_is_rejected() {
    let book = book();
    let taker = book.submit_order(market("taker", Side::Buy, 5)).unwrap();
    assert_eq!(taker.status(), OrderStatus::Rejected);
    assert_eq!(taker.filled(), 0);
}

#[test]
fn conservation_of_quantity_across_a_trade() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 7, TimeInForce::Gtc))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 7, TimeInForce::Gtc))
        .unwrap();
    // Total filled across taker must equal what was removed from the book.
    assert_eq!(taker.filled(), 7);
    assert!(book.best_ask().is_none());
}

#[test]
fn non_crossing_limit_orders_both_rest() {
    let book = book();
    book.submit_order(limit("bid", Side::Buy, 99, 10, TimeInForce::Gtc))
        .unwrap();
    book.submit_order(limit("ask", Side::Sell, 101, 10, TimeInForce::Gtc))
        .unwrap();
    assert_eq!(book.best_bid(), Some(99));
    assert_eq!(book.best_ask(), Some(101));
}

#[test]
fn trade_listener_observes_every_trade() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    let book = OrderBook::new("BTC/USD", BookLimits::default(), FeeSchedule::zero_fee())
        .with_trade_listener(Arc::new(move |_trade| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));
    book.submit_order(limit("maker", Side::Sell, 100, 10, TimeInForce::Gtc))
        .unwrap();
    book.submit_order(limit("taker", Side::Buy, 100, 10, TimeInForce::Gtc))
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
