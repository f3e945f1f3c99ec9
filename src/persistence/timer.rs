// =====================================================================
// File: persistence/timer.rs
//
// Description:
//   Elapsed-interval check for periodic snapshots. Connection handlers
//   consult it after every dispatched command and write a snapshot
//   when the interval has passed; the timer itself never does I/O.
// =====================================================================

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Tracks the time of the last snapshot across all connections.
#[derive(Debug)]
pub struct SnapshotTimer {
    interval: Duration,
    last: Mutex<Instant>,
}

impl SnapshotTimer {
    /// Create a timer that fires every `interval`, starting now.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(Instant::now()),
        }
    }

    /// Whether the interval has elapsed since the last `mark`.
    pub fn due(&self) -> bool {
        self.last.lock().elapsed() >= self.interval
    }

    /// Record that a snapshot was just written.
    pub fn mark(&self) {
        *self.last.lock() = Instant::now();
    }
}
