/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Point-in-time book snapshots, with an optional integrity checksum and a
//! selectable set of derived metrics.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

bitflags! {
    /// Which derived metrics to compute when building a snapshot. Computing
    /// only what's requested avoids walking both sides of the book for
    /// metrics a caller doesn't need.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MetricFlags: u32 {
        /// Midpoint of best bid and best ask.
        const MID_PRICE = 0b0001;
        /// Best ask minus best bid.
        const SPREAD = 0b0010;
        /// Total resting volume on each side.
        const DEPTH = 0b0100;
        /// All of the above.
        const ALL = Self::MID_PRICE.bits() | Self::SPREAD.bits() | Self::DEPTH.bits();
    }
}

/// A single price level in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevelSnapshot {
    pub price: u128,
    pub quantity: u64,
    pub order_count: usize,
}

/// Derived metrics, computed only for the flags requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    pub mid_price: Option<u128>,
    pub spread: Option<u128>,
    pub total_bid_depth: Option<u64>,
    pub total_ask_depth: Option<u64>,
}

/// A point-in-time view of one symbol's book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: String,
    /// Monotonically increasing per-book sequence number, bumped on every
    /// snapshot taken.
    pub sequence: u64,
    pub timestamp: u64,
    pub bids: Vec<PriceLevelSnapshot>,
    pub asks: Vec<PriceLevelSnapshot>,
    pub last_trade_price: Option<u128>,
    pub metrics: SnapshotMetrics,
}

impl OrderBookSnapshot {
    /// Best (highest) bid price, if any.
    #[must_use]
    pub fn best_bid(&self) -> Option<u128> {
        self.bids.first().map(|l| l.price)
    }

    /// Best (lowest) ask price, if any.
    #[must_use]
    pub fn best_ask(&self) -> Option<u128> {
        self.asks.first().map(|l| l.price)
    }

    /// SHA-256 checksum over the snapshot's price levels and sequence
    /// number, for detecting corruption in transit or at rest. Excludes
    /// `timestamp` so two snapshots taken back-to-back with no book
    /// mutation in between produce identical checksums.
    #[must_use]
    pub fn compute_checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.symbol.as_bytes());
        hasher.update(self.sequence.to_le_bytes());
        for level in &self.bids {
            hasher.update(level.price.to_le_bytes());
            hasher.update(level.quantity.to_le_bytes());
        }
        for level in &self.asks {
            hasher.update(level.price.to_le_bytes());
            hasher.update(level.quantity.to_le_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>()
    }
}

/// A snapshot bundled with its checksum, for wire transport or persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshotPackage {
    pub snapshot: OrderBookSnapshot,
    pub checksum: String,
}

impl OrderBookSnapshotPackage {
    /// Wraps `snapshot`, computing its checksum.
    #[must_use]
    pub fn new(snapshot: OrderBookSnapshot) -> Self {
        let checksum = snapshot.compute_checksum();
        Self { snapshot, checksum }
    }

    /// Recomputes the checksum and compares it against the stored one.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.snapshot.compute_checksum() == self.checksum
    }
}
