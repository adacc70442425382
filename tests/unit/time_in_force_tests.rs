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

fn book() -> OrderBook {
    OrderBook::new("BTC/USD", BookLimits::default(), FeeSchedule::zero_fee())
}

#[test]
fn ioc_cancels_unfilled_residual_instead_of_resting() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 4, TimeInForce::Gtc))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 10, TimeInForce::Ioc))
        .unwrap();
    assert_eq!(taker.filled(), 4);
    assert_eq!(taker.status(), OrderStatus::Cancelled);
    assert!(book.best_bid().is_none());
}

#[test]
fn ioc_with_full_fill_is_simply_filled() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 10, TimeInForce::Gtc))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 10, TimeInForce::Ioc))
        .unwrap();
    assert_eq!(taker.status(), OrderStatus::Filled);
}

#[test]
fn fok_all_or_nothing_rejects_on_partial_liquidity() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 4, TimeInForce::Gtc))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 10, TimeInForce::Fok))
        .unwrap();
    assert_eq!(taker.filled(), 0, "FOK must produce zero trades when it cannot fully fill");
    assert_eq!(taker.status(), OrderStatus::Cancelled);
    // The maker must be untouched.
    assert_eq!(book.best_ask(), Some(100));
}

#[test]
fn fok_fills_entirely_when_exactly_enough_liquidity_exists() {
    let book = book();
    book.submit_order(limit("m1", Side::Sell, 100, 5, TimeInForce::Gtc))
        .unwrap();
    book.submit_order(limit("m2", Side::Sell, 101, 5, TimeInForce::Gtc))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 101, 10, TimeInForce::Fok))
        .unwrap();
    assert_eq!(taker.status(), OrderStatus::Filled);
    assert!(book.best_ask().is_none());
}

#[test]
fn gtc_residual_rests_until_cancelled() {
    let book = book();
    let order = book
        .submit_order(limit("o1", Side::Buy, 100, 10, TimeInForce::Gtc))
        .unwrap();
    assert_eq!(order.status(), OrderStatus::New);
    assert_eq!(book.best_bid(), Some(100));
    book.cancel_order(&OrderId::from("o1")).unwrap();
    assert!(book.best_bid().is_none());
}

#[test]
fn day_order_rests_intraday_and_expires_on_session_close() {
    let book = book();
    let order = book
        .submit_order(limit("o1", Side::Buy, 100, 10, TimeInForce::Day))
        .unwrap();
    assert_eq!(order.status(), OrderStatus::New);

    let expired = book.close_session();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, OrderId::from("o1"));
    assert_eq!(expired[0].status(), OrderStatus::Expired);
    assert!(book.best_bid().is_none());
}

#[test]
fn day_order_can_still_match_before_session_close() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 10, TimeInForce::Day))
        .unwrap();
    let taker = book
        .submit_order(limit("taker", Side::Buy, 100, 10, TimeInForce::Gtc))
        .unwrap();
    assert_eq!(taker.status(), OrderStatus::Filled);
    assert!(book.close_session().is_empty());
}
