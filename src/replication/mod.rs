// =====================================================================
// File: replication/mod.rs
//
//! Single-master asynchronous replication.
//!
//! Structure:
//! - `master.rs`   : the follower registry, the unbounded mutation
//!                   queue, and the sender thread that fans entries
//!                   out newline-framed to every registered follower.
//! - `follower.rs` : dialing the master, registering, and the
//!                   ingestion thread that replays the stream through
//!                   the local executor.
//!
//! Delivery is at-most-once per connected follower: no acks, no
//! retries, no resumption cursor. A follower that reconnects after a
//! gap must be rebuilt from the master's snapshot and log.
// =====================================================================

pub mod follower;
pub mod master;

pub use self::master::{FollowerRegistry, ReplicationQueue, spawn_sender};

#[cfg(test)]
mod tests;
