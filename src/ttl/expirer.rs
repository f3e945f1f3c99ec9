// =====================================================================
// File: ttl/expirer.rs
//
// Description:
//   Background expiry sweep. One thread per server instance sleeps for
//   the configured interval, takes the global keyspace lock, removes
//   every key whose deadline has passed, and releases. Readers never
//   depend on the sweep for correctness (expired keys are filtered at
//   read time); the sweep only reclaims storage.
// =====================================================================

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::store::Keyspace;

/// Spawn the expiry sweep thread.
///
/// The thread runs for the lifetime of the process. The sleep happens
/// outside the keyspace lock, so a long interval never delays command
/// execution.
pub fn spawn_expirer(keyspace: Arc<Mutex<Keyspace>>, interval: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            thread::sleep(interval);
            let removed = keyspace.lock().expire_pass();
            if !removed.is_empty() {
                debug!(count = removed.len(), "expiry sweep removed stale keys");
            }
        }
    })
}
