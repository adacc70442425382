/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Engine-wide counters and latency histograms.

use hdrhistogram::Histogram;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Engine-wide order/trade counters plus an order-acceptance latency
/// histogram, recorded in microseconds.
///
/// The histogram is behind a `Mutex` rather than a lock-free structure:
/// `hdrhistogram::Histogram::record` takes `&mut self`, and latency
/// recording is off the matching hot path (it wraps the whole admission
/// call, not the crossing loop itself), so a short-held mutex is an
/// acceptable trade for accurate percentiles over a lock-free approximation.
pub struct EngineStats {
    orders_accepted: AtomicU64,
    orders_rejected: AtomicU64,
    trades_executed: AtomicU64,
    total_volume: AtomicU64,
    acceptance_latency_us: Mutex<Histogram<u64>>,
}

impl EngineStats {
    /// Creates a fresh, empty stats tracker.
    pub fn new() -> Self {
        Self {
            orders_accepted: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
            total_volume: AtomicU64::new(0),
            acceptance_latency_us: Mutex::new(
                Histogram::new(3).expect("histogram construction with valid precision"),
            ),
        }
    }

    /// Records one accepted order and its admission latency.
    pub fn record_accepted(&self, latency_us: u64) {
        self.orders_accepted.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut hist) = self.acceptance_latency_us.lock() {
            let _ = hist.record(latency_us);
        }
    }

    /// Records one rejected order.
    pub fn record_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` trades totalling `volume` units of traded quantity.
    pub fn record_trades(&self, count: u64, volume: u64) {
        self.trades_executed.fetch_add(count, Ordering::Relaxed);
        self.total_volume.fetch_add(volume, Ordering::Relaxed);
    }

    /// Snapshot of all counters and latency percentiles.
    #[must_use]
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        let hist = self.acceptance_latency_us.lock().ok();
        let (min, avg, p50, p99, max) = hist
            .map(|h| {
                (
                    if h.len() == 0 { 0 } else { h.min() },
                    h.mean() as u64,
                    h.value_at_quantile(0.50),
                    h.value_at_quantile(0.99),
                    h.max(),
                )
            })
            .unwrap_or((0, 0, 0, 0, 0));

        EngineStatsSnapshot {
            orders_accepted: self.orders_accepted.load(Ordering::Relaxed),
            orders_rejected: self.orders_rejected.load(Ordering::Relaxed),
            trades_executed: self.trades_executed.load(Ordering::Relaxed),
            total_volume: self.total_volume.load(Ordering::Relaxed),
            acceptance_latency_min_us: min,
            acceptance_latency_avg_us: avg,
            acceptance_latency_p50_us: p50,
            acceptance_latency_p99_us: p99,
            acceptance_latency_max_us: max,
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time view of [`EngineStats`], safe to serialize and expose
/// over a stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatsSnapshot {
    pub orders_accepted: u64,
    pub orders_rejected: u64,
    pub trades_executed: u64,
    pub total_volume: u64,
    pub acceptance_latency_min_us: u64,
    pub acceptance_latency_avg_us: u64,
    pub acceptance_latency_p50_us: u64,
    pub acceptance_latency_p99_us: u64,
    pub acceptance_latency_max_us: u64,
}
