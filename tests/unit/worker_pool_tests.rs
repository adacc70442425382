use matching_engine::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn concurrency_is_capped_at_the_configured_worker_count() {
    let pool = Arc::new(WorkerPool::new(2, 10, Duration::from_millis(500), Duration::from_millis(200)));
    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pool = pool.clone();
        let concurrent = concurrent.clone();
        let max_seen = max_seen.clone();
        handles.push(tokio::spawn(async move {
            pool.submit(move || {
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(30));
                concurrent.fetch_sub(1, Ordering::SeqCst);
            })
            .await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    assert!(max_seen.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn a_panic_in_one_task_does_not_prevent_later_submissions() {
    let pool = WorkerPool::new(1, 10, Duration::from_millis(500), Duration::from_millis(200));
    let panicked = pool.submit(|| -> i32 { panic!("deliberate") }).await;
    assert!(panicked.is_err());

    let ok = pool.submit(|| 7).await.unwrap();
    assert_eq!(ok, 7);
    assert_eq!(pool.stats().completed, 1);
    assert_eq!(pool.stats().panicked, 1);
}

#[tokio::test]
async fn current_workers_grows_under_load_and_shrinks_back_to_the_floor() {
    let pool = Arc::new(WorkerPool::new(3, 10, Duration::from_millis(500), Duration::from_millis(20)));
    assert_eq!(pool.stats().current_workers, 1);

    let mut handles = Vec::new();
    for _ in 0..3 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            pool.submit(|| std::thread::sleep(Duration::from_millis(60))).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pool.stats().current_workers, 1);
}
