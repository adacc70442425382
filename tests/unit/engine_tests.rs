use matching_engine::prelude::*;

fn limit(id: &str, side: Side, price: u128, qty: u64, tif: TimeInForce) -> Order {
    Order::new(
        OrderId::from(id),
        "ignored-by-engine-dispatch",
        side,
        OrderKind::Limit,
        price,
        0,
        qty,
        tif,
        "user-1",
    )
}

#[tokio::test]
async fn each_symbol_gets_its_own_independent_book() {
    let (engine, _trades) = MatchingEngine::new(EngineConfig::default());
    engine.start().await.unwrap();

    engine
        .submit_order("BTC/USD", limit("b1", Side::Buy, 100, 10, TimeInForce::Gtc))
        .await
        .unwrap();
    engine
        .submit_order("ETH/USD", limit("e1", Side::Buy, 50, 20, TimeInForce::Gtc))
        .await
        .unwrap();

    let btc = engine.snapshot("BTC/USD", MetricFlags::empty()).unwrap();
    let eth = engine.snapshot("ETH/USD", MetricFlags::empty()).unwrap();
    assert_eq!(btc.best_bid(), Some(100));
    assert_eq!(eth.best_bid(), Some(50));
}

#[tokio::test]
async fn symbols_lists_only_books_actually_created() {
    let (engine, _trades) = MatchingEngine::new(EngineConfig::default());
    engine.start().await.unwrap();
    assert!(engine.symbols().is_empty());

    engine
        .submit_order("BTC/USD", limit("b1", Side::Buy, 100, 10, TimeInForce::Gtc))
        .await
        .unwrap();
    let mut symbols = engine.symbols();
    symbols.sort();
    assert_eq!(symbols, vec!["BTC/USD".to_string()]);
}

#[tokio::test]
async fn close_session_on_an_unknown_symbol_returns_no_orders() {
    let (engine, _trades) = MatchingEngine::new(EngineConfig::default());
    engine.start().await.unwrap();
    assert!(engine.close_session("NOTHING/YET").is_empty());
}

#[tokio::test]
async fn close_session_expires_day_orders_for_the_named_symbol_only() {
    let (engine, _trades) = MatchingEngine::new(EngineConfig::default());
    engine.start().await.unwrap();
    engine
        .submit_order("BTC/USD", limit("d1", Side::Buy, 100, 10, TimeInForce::Day))
        .await
        .unwrap();
    engine
        .submit_order("ETH/USD", limit("d2", Side::Buy, 50, 10, TimeInForce::Day))
        .await
        .unwrap();

    let expired = engine.close_session("BTC/USD");
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, OrderId::from("d1"));
    assert!(engine.snapshot("BTC/USD", MetricFlags::empty()).unwrap().best_bid().is_none());
    assert_eq!(
        engine.snapshot("ETH/USD", MetricFlags::empty()).unwrap().best_bid(),
        Some(50)
    );
}

#[tokio::test]
async fn stopping_the_engine_rejects_further_submissions() {
    let (engine, _trades) = MatchingEngine::new(EngineConfig::default());
    engine.start().await.unwrap();
    engine
        .submit_order("BTC/USD", limit("o1", Side::Buy, 100, 10, TimeInForce::Gtc))
        .await
        .unwrap();
    engine.stop();
    let result = engine
        .submit_order("BTC/USD", limit("o2", Side::Buy, 99, 10, TimeInForce::Gtc))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidEngineState { .. })));
}

#[tokio::test]
async fn snapshot_of_an_unknown_symbol_is_none() {
    let (engine, _trades) = MatchingEngine::new(EngineConfig::default());
    engine.start().await.unwrap();
    assert!(engine.snapshot("NOPE/USD", MetricFlags::empty()).is_none());
}

#[tokio::test]
async fn rejected_orders_count_toward_rejected_stats_not_accepted() {
    let mut config = EngineConfig::default();
    config.book_limits.min_order_size = Some(5);
    let (engine, _trades) = MatchingEngine::new(config);
    engine.start().await.unwrap();

    let rejected = engine
        .submit_order("BTC/USD", limit("too-small", Side::Buy, 100, 1, TimeInForce::Gtc))
        .await
        .unwrap();
    assert_eq!(rejected.status(), OrderStatus::Rejected);
    let stats = engine.stats();
    assert_eq!(stats.orders_rejected, 1);
    assert_eq!(stats.orders_accepted, 0);
}

#[tokio::test]
async fn multiple_trades_are_all_published_on_the_output_channel_in_order() {
    let (engine, mut trades) = MatchingEngine::new(EngineConfig::default());
    engine.start().await.unwrap();
    engine
        .submit_order("BTC/USD", limit("m1", Side::Sell, 100, 5, TimeInForce::Gtc))
        .await
        .unwrap();
    engine
        .submit_order("BTC/USD", limit("m2", Side::Sell, 101, 5, TimeInForce::Gtc))
        .await
        .unwrap();
    engine
        .submit_order("BTC/USD", limit("taker", Side::Buy, 101, 10, TimeInForce::Gtc))
        .await
        .unwrap();

    let first = trades.recv().await.unwrap();
    let second = trades.recv().await.unwrap();
    assert_eq!(first.price, 100);
    assert_eq!(second.price, 101);
}
