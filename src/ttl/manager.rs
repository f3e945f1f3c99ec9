// =====================================================================
// File: ttl/manager.rs
//
//! The [`TtlManager`] tracks expiration deadlines for keys in the
//! keyspace. An entry exists in the table iff the key has a finite TTL.
//!
//! Deadlines are monotonic `Instant`s, so wall-clock adjustments cannot
//! resurrect or prematurely kill a key. Checks are read-side and cheap;
//! storage reclamation is left to the caller (lazily on access, or in
//! bulk by the background expirer).
// =====================================================================

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Deadline table mapping keys to the instant they stop being visible.
#[derive(Debug, Default)]
pub struct TtlManager {
    deadlines: HashMap<String, Instant>,
}

impl TtlManager {
    /// Create a new, empty deadline table.
    pub fn new() -> Self {
        Self {
            deadlines: HashMap::new(),
        }
    }

    /// Set or replace the deadline for a key.
    ///
    /// A zero duration marks the key as expired immediately. A duration
    /// large enough to overflow the clock is treated as "never expires"
    /// and clears any existing deadline.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use kvserver::TtlManager;
    ///
    /// let mut ttl = TtlManager::new();
    /// ttl.set_deadline("dog", Duration::from_secs(5));
    /// assert!(ttl.has_entry("dog"));
    /// assert!(!ttl.is_expired("dog"));
    /// ```
    pub fn set_deadline(&mut self, key: &str, ttl: Duration) {
        match Instant::now().checked_add(ttl) {
            Some(deadline) => {
                self.deadlines.insert(key.to_string(), deadline);
            }
            None => {
                self.deadlines.remove(key);
            }
        }
    }

    /// Remove the deadline for a key, making it persistent again.
    ///
    /// # Returns
    /// `true` if a deadline existed and was removed.
    pub fn clear_deadline(&mut self, key: &str) -> bool {
        self.deadlines.remove(key).is_some()
    }

    /// Whether the key's deadline has passed.
    ///
    /// Keys without a deadline never expire. This check does not mutate
    /// the table; callers that hold the keyspace lock reclaim storage
    /// separately.
    pub fn is_expired(&self, key: &str) -> bool {
        self.deadlines
            .get(key)
            .is_some_and(|deadline| Instant::now() >= *deadline)
    }

    /// Collect every key whose deadline has passed, for a bulk sweep.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.deadlines
            .iter()
            .filter(|(_, deadline)| now >= **deadline)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Whether the key currently has a deadline recorded.
    pub fn has_entry(&self, key: &str) -> bool {
        self.deadlines.contains_key(key)
    }

    /// Number of keys with a deadline. Used by tests and diagnostics.
    pub fn active_count(&self) -> usize {
        self.deadlines.len()
    }
}
