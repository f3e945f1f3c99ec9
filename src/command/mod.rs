// =====================================================================
// File: command/mod.rs
//
//! The `command` module parses and executes single protocol commands.
//!
//! Structure:
//! - `executor.rs` : the [`Command`] grammar, the parser, and the
//!                   [`Executor`] that applies commands to the
//!                   keyspace under the global mutex, builds the wire
//!                   reply, and propagates successful writes to the
//!                   append-only log and the replication queue.
// =====================================================================

pub mod executor;

pub use self::executor::{Command, Executor, ParseError};
