//! # kvserver
//! An in-memory key/value store served over a line-oriented TCP
//! protocol, loosely modeled on a subset of Redis.
//!
//! ## Features
//! - String and list values: `SET`/`GET`/`DEL`, `LPUSH`/`RPUSH`,
//!   `LPOP`/`RPOP`, `LRANGE`
//! - Atomic counters: `INCR` / `DECR`
//! - Time-to-live expiration: `SET key value EX seconds`, enforced at
//!   read time and reclaimed by a background sweep
//! - Multi-command transactions: `MULTI` ... `EXEC` / `DISCARD`,
//!   executed as one critical section
//! - Dual persistence: an append-only command log plus periodic
//!   snapshots, replayed on startup
//! - Single-master asynchronous replication to any number of
//!   followers
//!
//! ## Usage
//! This crate is primarily consumed by the binary in `main.rs`, which
//! parses the startup configuration and runs a [`Server`]. All
//! reusable logic and the unit tests live here.
// =====================================================================
// File: lib.rs
//
// Description:
//   Crate root. One module per subsystem, with the types a consumer
//   (the binary, the tests) needs re-exported at the top level.
//
//   Concurrency model: one OS thread per connection plus two fixed
//   background workers (TTL expirer; replication sender on a master,
//   stream ingester on a follower). The keyspace and its TTL table
//   live behind a single global mutex, and no thread holds that mutex
//   across a network read, a network write, or a sleep.
// =====================================================================

pub mod command;
pub mod config;
pub mod error;
pub mod persistence;
pub mod replication;
pub mod server;
pub mod store;
pub mod transaction;
pub mod ttl;

pub use command::{Command, Executor, ParseError};
pub use config::{Config, Role};
pub use error::ServerError;
pub use persistence::{AofLog, Snapshot, SnapshotTimer};
pub use replication::{FollowerRegistry, ReplicationQueue};
pub use server::Server;
pub use store::{Keyspace, Value, ValueError};
pub use transaction::Transaction;
pub use ttl::{TtlManager, spawn_expirer};
