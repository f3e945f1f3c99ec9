// =====================================================================
// File: persistence/mod.rs
//
//! The `persistence` module provides the two durability artifacts:
//!
//! - `aof.rs`      : the append-only command log, one applied mutation
//!                   per line, flushed per write. The full-fidelity
//!                   recovery source.
//! - `snapshot.rs` : the point-in-time dump of string entries, written
//!                   by `SAVE` or on the periodic timer.
//! - `timer.rs`    : the elapsed-interval check the connection handler
//!                   uses to trigger periodic snapshots.
//!
//! Recovery order is snapshot first, then the log, so the log wins.
// =====================================================================

pub mod aof;
pub mod snapshot;
pub mod timer;

pub use self::aof::AofLog;
pub use self::snapshot::Snapshot;
pub use self::timer::SnapshotTimer;

#[cfg(test)]
mod tests;
