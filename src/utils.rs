/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 2/10/25
******************************************************************************/

//! Small standalone helpers shared across the crate.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Used as the monotonic-enough tie-breaker for order acceptance timestamps
/// and as the timestamp carried on trades and book events. Not used to
/// establish FIFO order within a price level — that is the responsibility
/// of the level's arrival queue, not of comparing timestamps.
#[must_use]
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
