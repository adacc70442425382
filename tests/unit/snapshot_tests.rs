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

fn book() -> OrderBook {
    OrderBook::new("BTC/USD", BookLimits::default(), FeeSchedule::zero_fee())
}

#[test]
fn empty_book_snapshot_has_no_levels_or_metrics() {
    let book = book();
    let snap = book.snapshot(MetricFlags::ALL);
    assert!(snap.bids.is_empty());
    assert!(snap.asks.is_empty());
    assert!(snap.best_bid().is_none());
    assert!(snap.best_ask().is_none());
    assert!(snap.metrics.mid_price.is_none());
    assert!(snap.metrics.spread.is_none());
    assert!(snap.last_trade_price.is_none());
}

#[test]
fn snapshot_orders_levels_by_priority_on_both_sides() {
    let book = book();
    book.submit_order(limit("b1", Side::Buy, 99, 10)).unwrap();
    book.submit_order(limit("b2", Side::Buy, 101, 5)).unwrap();
    book.submit_order(limit("a1", Side::Sell, 105, 5)).unwrap();
    book.submit_order(limit("a2", Side::Sell, 103, 10)).unwrap();

    let snap = book.snapshot(MetricFlags::empty());
    assert_eq!(snap.bids.iter().map(|l| l.price).collect::<Vec<_>>(), vec![101, 99]);
    assert_eq!(snap.asks.iter().map(|l| l.price).collect::<Vec<_>>(), vec![103, 105]);
}

#[test]
fn metric_flags_selectively_compute_only_requested_fields() {
    let book = book();
    book.submit_order(limit("b1", Side::Buy, 99, 10)).unwrap();
    book.submit_order(limit("a1", Side::Sell, 101, 5)).unwrap();

    let mid_only = book.snapshot(MetricFlags::MID_PRICE);
    assert_eq!(mid_only.metrics.mid_price, Some(100));
    assert!(mid_only.metrics.spread.is_none());
    assert!(mid_only.metrics.total_bid_depth.is_none());

    let depth_only = book.snapshot(MetricFlags::DEPTH);
    assert!(depth_only.metrics.mid_price.is_none());
    assert_eq!(depth_only.metrics.total_bid_depth, Some(10));
    assert_eq!(depth_only.metrics.total_ask_depth, Some(5));
}

#[test]
fn sequence_number_is_monotonic_across_repeated_snapshots() {
    let book = book();
    let first = book.snapshot(MetricFlags::empty()).sequence;
    let second = book.snapshot(MetricFlags::empty()).sequence;
    let third = book.snapshot(MetricFlags::empty()).sequence;
    assert!(second > first);
    assert!(third > second);
}

#[test]
fn last_trade_price_appears_only_after_a_trade() {
    let book = book();
    assert!(book.snapshot(MetricFlags::empty()).last_trade_price.is_none());

    book.submit_order(limit("maker", Side::Sell, 100, 10)).unwrap();
    book.submit_order(limit("taker", Side::Buy, 100, 10)).unwrap();
    assert_eq!(book.snapshot(MetricFlags::empty()).last_trade_price, Some(100));
}

#[test]
fn checksum_is_stable_for_unchanged_book_and_changes_after_a_mutation() {
    let book = book();
    book.submit_order(limit("b1", Side::Buy, 99, 10)).unwrap();

    let first = OrderBookSnapshotPackage::new(book.snapshot(MetricFlags::empty()));
    assert!(first.verify());

    book.submit_order(limit("b2", Side::Buy, 98, 5)).unwrap();
    let second = OrderBookSnapshotPackage::new(book.snapshot(MetricFlags::empty()));
    assert!(second.verify());
    assert_ne!(first.checksum, second.checksum);
}

#[test]
fn tampering_with_a_snapshot_after_packaging_fails_verification() {
    let book = book();
    book.submit_order(limit("b1", Side::Buy, 99, 10)).unwrap();
    let mut package = OrderBookSnapshotPackage::new(book.snapshot(MetricFlags::empty()));
    assert!(package.verify());

    package.snapshot.bids[0].quantity = 9999;
    assert!(!package.verify());
}

#[test]
fn snapshot_reflects_partial_fills_immediately() {
    let book = book();
    book.submit_order(limit("maker", Side::Sell, 100, 10)).unwrap();
    book.submit_order(limit("taker", Side::Buy, 100, 4)).unwrap();

    let snap = book.snapshot(MetricFlags::empty());
    assert_eq!(snap.asks.len(), 1);
    assert_eq!(snap.asks[0].quantity, 6);
    assert_eq!(snap.asks[0].order_count, 1);
}
