// =====================================================================
// File: store/keyspace.rs
//
// Description:
//   The in-memory keyspace: key -> typed value plus the TTL deadline
//   table, owned together so one mutex guards both. All reads consult
//   the deadline table first and treat stale entries as absent, which
//   makes expired keys unobservable even before the background sweep
//   reclaims them.
//
// Responsibilities:
//   - String storage with optional TTL (SET/GET/DEL/INCR/DECR).
//   - List storage with push/pop on both ends and inclusive ranges.
//   - Bulk expiry for the background sweep.
// =====================================================================

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use thiserror::Error;

use crate::ttl::TtlManager;

/// A stored value: plain text or an ordered list of text items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    List(VecDeque<String>),
}

/// Typed-access failures, surfaced to clients as inline `ERROR:` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    /// `INCR`/`DECR` on text that does not parse as a signed integer.
    #[error("Value is not an integer")]
    NotInteger,

    /// `GET` on a key that holds a list.
    #[error("Value is not a string")]
    NotString,

    /// A list operation on a key that holds a string.
    #[error("Value is not a list")]
    NotList,
}

/// The single source of truth: all resident data plus TTL metadata.
///
/// Callers hold the global mutex for the duration of each operation;
/// the keyspace itself is plain data.
///
/// # Example
/// ```
/// use kvserver::Keyspace;
///
/// let mut ks = Keyspace::new();
/// ks.set("dog".into(), "bark".into(), None);
/// assert_eq!(ks.get("dog"), Ok(Some("bark")));
/// assert_eq!(ks.get("cat"), Ok(None));
/// ```
#[derive(Debug, Default)]
pub struct Keyspace {
    entries: HashMap<String, Value>,
    ttl: TtlManager,
}

impl Keyspace {
    /// Create an empty keyspace.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            ttl: TtlManager::new(),
        }
    }

    /// Read a string value.
    ///
    /// Expired keys read as absent and are reclaimed on the spot.
    ///
    /// # Returns
    /// * `Ok(Some(value))` for a live string entry.
    /// * `Ok(None)` for a missing or expired key.
    /// * `Err(ValueError::NotString)` when the key holds a list.
    pub fn get(&mut self, key: &str) -> Result<Option<&str>, ValueError> {
        if self.reclaim_if_expired(key) {
            return Ok(None);
        }
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Str(text)) => Ok(Some(text.as_str())),
            Some(Value::List(_)) => Err(ValueError::NotString),
        }
    }

    /// Store a string value, replacing whatever was there.
    ///
    /// A `ttl` of `Some(d)` arms the deadline table; `None` clears any
    /// previous deadline, so a plain `SET` always produces a persistent
    /// key.
    pub fn set(&mut self, key: String, value: String, ttl: Option<Duration>) {
        match ttl {
            Some(duration) => self.ttl.set_deadline(&key, duration),
            None => {
                self.ttl.clear_deadline(&key);
            }
        }
        self.entries.insert(key, Value::Str(value));
    }

    /// Remove a key of any type.
    ///
    /// # Returns
    /// `true` if a live entry was removed. Expired keys count as
    /// already gone.
    pub fn del(&mut self, key: &str) -> bool {
        if self.reclaim_if_expired(key) {
            return false;
        }
        self.ttl.clear_deadline(key);
        self.entries.remove(key).is_some()
    }

    /// Add `delta` to the integer stored at `key`.
    ///
    /// # Returns
    /// * `Ok(Some(new))` on success, with the updated value.
    /// * `Ok(None)` when the key is missing; the key is not created.
    /// * `Err(ValueError::NotInteger)` when the stored text does not
    ///   parse as `i64` (lists included).
    pub fn incr(&mut self, key: &str, delta: i64) -> Result<Option<i64>, ValueError> {
        if self.reclaim_if_expired(key) {
            return Ok(None);
        }
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Value::List(_)) => Err(ValueError::NotInteger),
            Some(Value::Str(text)) => {
                let current: i64 = text.parse().map_err(|_| ValueError::NotInteger)?;
                let next = current.wrapping_add(delta);
                *text = next.to_string();
                Ok(Some(next))
            }
        }
    }

    /// Push values onto the head of the list at `key`, creating it if
    /// missing. Values are pushed one at a time, so `LPUSH k a b`
    /// leaves the head `b, a`.
    pub fn push_front(&mut self, key: &str, values: Vec<String>) -> Result<usize, ValueError> {
        self.reclaim_if_expired(key);
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()))
        {
            Value::Str(_) => Err(ValueError::NotList),
            Value::List(list) => {
                for value in values {
                    list.push_front(value);
                }
                Ok(list.len())
            }
        }
    }

    /// Append values to the tail of the list at `key`, creating it if
    /// missing. `RPUSH k a b` leaves the tail `a, b`.
    pub fn push_back(&mut self, key: &str, values: Vec<String>) -> Result<usize, ValueError> {
        self.reclaim_if_expired(key);
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()))
        {
            Value::Str(_) => Err(ValueError::NotList),
            Value::List(list) => {
                list.extend(values);
                Ok(list.len())
            }
        }
    }

    /// Pop from the head of the list at `key`.
    ///
    /// Missing, expired, and empty lists all report `Ok(None)`.
    pub fn pop_front(&mut self, key: &str) -> Result<Option<String>, ValueError> {
        if self.reclaim_if_expired(key) {
            return Ok(None);
        }
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Value::Str(_)) => Err(ValueError::NotList),
            Some(Value::List(list)) => Ok(list.pop_front()),
        }
    }

    /// Pop from the tail of the list at `key`.
    pub fn pop_back(&mut self, key: &str) -> Result<Option<String>, ValueError> {
        if self.reclaim_if_expired(key) {
            return Ok(None);
        }
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Value::Str(_)) => Err(ValueError::NotList),
            Some(Value::List(list)) => Ok(list.pop_back()),
        }
    }

    /// Inclusive slice `[start, stop]` of the list at `key`.
    ///
    /// Negative indices address from the end of the list, and the
    /// exclusive end is `stop + 1` before that translation, so a stop
    /// of `-1` names an empty slice. Indices clamp to the available
    /// range; an inverted range yields an empty slice. `None` means
    /// the key is missing or not a list.
    pub fn range(&mut self, key: &str, start: i64, stop: i64) -> Option<Vec<String>> {
        if self.reclaim_if_expired(key) {
            return None;
        }
        match self.entries.get(key) {
            Some(Value::List(list)) => {
                let len = list.len() as i64;
                let mut start = if start < 0 { start + len } else { start };
                let mut end = stop + 1;
                if end < 0 {
                    end += len;
                }
                start = start.clamp(0, len);
                end = end.clamp(0, len);
                if start >= end {
                    return Some(Vec::new());
                }
                Some(
                    list.iter()
                        .skip(start as usize)
                        .take((end - start) as usize)
                        .cloned()
                        .collect(),
                )
            }
            _ => None,
        }
    }

    /// Remove every key whose deadline has passed, from both the
    /// entry map and the deadline table.
    ///
    /// # Returns
    /// The keys that were reclaimed.
    pub fn expire_pass(&mut self) -> Vec<String> {
        let stale = self.ttl.expired_keys();
        for key in &stale {
            self.entries.remove(key);
            self.ttl.clear_deadline(key);
        }
        stale
    }

    /// Live string entries, for the snapshot writer. List entries and
    /// deadlines are not part of the snapshot format.
    pub fn string_entries(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        let ttl = &self.ttl;
        self.entries.iter().filter_map(move |(key, value)| match value {
            Value::Str(text) if !ttl.is_expired(key) => Some((key.as_str(), text.as_str())),
            _ => None,
        })
    }

    /// Whether a live entry exists for `key` (expired keys read as
    /// absent but are not reclaimed by this check).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key) && !self.ttl.is_expired(key)
    }

    /// Number of resident entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys with an armed deadline. Diagnostics and tests.
    pub fn ttl_active_count(&self) -> usize {
        self.ttl.active_count()
    }

    // Drops the entry and its deadline when stale. Returns true if the
    // key was reclaimed, so callers can answer "absent" immediately.
    fn reclaim_if_expired(&mut self, key: &str) -> bool {
        if self.ttl.is_expired(key) {
            self.entries.remove(key);
            self.ttl.clear_deadline(key);
            true
        } else {
            false
        }
    }
}
