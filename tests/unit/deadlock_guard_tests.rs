use matching_engine::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn multiple_readers_can_hold_the_lock_concurrently() {
    let guard = DeadlockGuard::new("registry", Duration::from_millis(100), 7i32);
    let r1 = guard.read().await.unwrap();
    let r2 = guard.read().await.unwrap();
    assert_eq!(*r1, 7);
    assert_eq!(*r2, 7);
}

#[tokio::test]
async fn write_succeeds_once_readers_have_released() {
    let guard = DeadlockGuard::new("registry", Duration::from_millis(200), 0i32);
    {
        let _r = guard.read().await.unwrap();
    }
    let mut w = guard.write().await.unwrap();
    *w = 99;
    drop(w);
    assert_eq!(*guard.read().await.unwrap(), 99);
}

#[tokio::test]
async fn read_times_out_while_a_writer_holds_the_lock() {
    let guard = DeadlockGuard::new("registry", Duration::from_millis(20), 0i32);
    let _writer = guard.write().await.unwrap();
    let result = guard.read().await;
    assert!(matches!(result, Err(EngineError::LockTimeout { ref name, .. }) if name == "registry"));
}
