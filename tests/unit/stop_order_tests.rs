use matching_engine::prelude::*;

fn limit(id: &str, side: Side, price: u128, qty: u64) -> Order {
    Order::new(
        OrderId::from(id),
        "BTC/USD",
        side,
        OrderKind::Limit,
        price,
        0,
        qty,
        TimeInForce::Gtc,
        "user-1",
    )
}

fn stop(id: &str, side: Side, stop_price: u128, qty: u64) -> Order {
    Order::new(
        OrderId::from(id),
        "BTC/USD",
        side,
        OrderKind::Stop,
        0,
        stop_price,
        qty,
        TimeInForce::Gtc,
        "user-1",
    )
}

fn stop_limit(id: &str, side: Side, limit_price: u128, stop_price: u128, qty: u64) -> Order {
    Order::new(
        OrderId::from(id),
        "BTC/USD",
        side,
        OrderKind::StopLimit,
        limit_price,
        stop_price,
        qty,
        TimeInForce::Gtc,
        "user-1",
    )
}

fn book() -> OrderBook {
    OrderBook::new("BTC/USD", BookLimits::default(), FeeSchedule::zero_fee())
}

#[test]
fn stop_order_does_not_rest_on_either_side_while_parked() {
    let book = book();
    book.submit_order(stop("s1", Side::Buy, 110, 10)).unwrap();
    assert!(book.best_bid().is_none());
    assert!(book.best_ask().is_none());
}

#[test]
fn buy_stop_triggers_and_executes_as_market_once_price_reaches_stop() {
    let book = book();
    book.submit_order(stop("s1", Side::Buy, 105, 10)).unwrap();

    // A trade at 100 shouldn't trigger the stop.
    book.submit_order(limit("m1", Side::Sell, 100, 5)).unwrap();
    book.submit_order(limit("t1", Side::Buy, 100, 5)).unwrap();
    assert_eq!(book.last_trade_price(), Some(100));
    assert!(book.get_order(&OrderId::from("s1")).is_none());

    // A trade at 105 (or above) triggers it; the stop then sweeps the ask side.
    book.submit_order(limit("m2", Side::Sell, 105, 20)).unwrap();
    book.submit_order(limit("t2", Side::Buy, 105, 5)).unwrap();
    // Triggering the stop submits it as a market buy for 10, consuming
    // further resting ask liquidity at 105.
    let snap = book.snapshot(MetricFlags::empty());
    let remaining_at_105: u64 = snap.asks.iter().filter(|l| l.price == 105).map(|l| l.quantity).sum();
    assert_eq!(remaining_at_105, 5); // 20 - 5 (t2) - 10 (triggered stop)
}

#[test]
fn sell_stop_triggers_when_price_falls_to_or_below() {
    let book = book();
    book.submit_order(stop("s1", Side::Sell, 95, 10)).unwrap();

    book.submit_order(limit("m1", Side::Buy, 95, 20)).unwrap();
    book.submit_order(limit("t1", Side::Sell, 95, 5)).unwrap();

    assert!(book.get_order(&OrderId::from("s1")).is_none());
    let snap = book.snapshot(MetricFlags::empty());
    let remaining_at_95: u64 = snap.bids.iter().filter(|l| l.price == 95).map(|l| l.quantity).sum();
    assert_eq!(remaining_at_95, 5); // 20 - 5 (t1) - 10 (triggered stop)
}

#[test]
fn stop_limit_becomes_a_resting_limit_order_once_triggered_if_unfilled() {
    let book = book();
    book.submit_order(stop_limit("s1", Side::Buy, 100, 105, 10))
        .unwrap();

    book.submit_order(limit("m1", Side::Sell, 105, 2)).unwrap();
    book.submit_order(limit("t1", Side::Buy, 105, 2)).unwrap();

    // Stop-limit triggers as a Limit(100) buy for 10; with no more asks at or
    // below 100, it rests on the bid side instead of cancelling.
    assert_eq!(book.best_bid(), Some(100));
}

#[test]
fn a_parked_stop_order_can_be_cancelled_before_triggering() {
    let book = book();
    book.submit_order(stop("s1", Side::Buy, 200, 10)).unwrap();
    let cancelled = book.cancel_order(&OrderId::from("s1")).unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);

    book.submit_order(limit("m1", Side::Sell, 200, 30)).unwrap();
    book.submit_order(limit("t1", Side::Buy, 200, 5)).unwrap();
    // The cancelled stop must not have triggered and consumed the residual
    // ask liquidity left after t1's trade.
    let snap = book.snapshot(MetricFlags::empty());
    let remaining_at_200: u64 = snap.asks.iter().filter(|l| l.price == 200).map(|l| l.quantity).sum();
    assert_eq!(remaining_at_200, 25);
}
