use matching_engine::prelude::*;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_admissions_never_exceed_the_limit() {
    let bp = Arc::new(BackpressureManager::new(4));
    let mut handles = Vec::new();
    for _ in 0..16 {
        let bp = bp.clone();
        handles.push(thread::spawn(move || bp.try_admit().is_ok()));
    }
    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&ok| ok)
        .count();
    assert_eq!(admitted, 4);
    assert_eq!(bp.current_load(), 4);
}

#[test]
fn execute_propagates_rejection_without_running_the_closure() {
    let bp = BackpressureManager::new(0);
    let ran = std::sync::atomic::AtomicBool::new(false);
    let result = bp.execute(|| ran.store(true, std::sync::atomic::Ordering::SeqCst));
    assert!(result.is_err());
    assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn rejection_error_reports_the_load_that_would_have_resulted() {
    let bp = BackpressureManager::new(1);
    bp.try_admit().unwrap();
    let err = bp.try_admit().unwrap_err();
    assert_eq!(err, 1);
}

#[test]
fn stats_last_rejection_timestamp_only_updates_on_rejection() {
    let bp = BackpressureManager::new(5);
    bp.try_admit().unwrap();
    assert_eq!(bp.stats().last_rejection_at, 0);
    let bp = BackpressureManager::new(0);
    let _ = bp.try_admit();
    assert!(bp.stats().last_rejection_at > 0);
}
