// =====================================================================
// File: transaction/mod.rs
//
//! Module entry point for the per-connection transaction state
//! machine. Each connection owns exactly one [`Transaction`]; the
//! state is never shared between connections, so concurrent clients
//! cannot contaminate each other's buffers.
// =====================================================================

pub mod transaction;

pub use self::transaction::Transaction;
