// =====================================================================
// File: error.rs
//
// Description:
//   Fatal error taxonomy for the server binary. User-facing command
//   errors are plain reply strings handled by the executor; the types
//   here cover the failures that abort startup or a background worker.
// =====================================================================

use std::io;

use thiserror::Error;

/// Errors that terminate server startup or a replication worker.
///
/// Inline protocol errors (unknown verbs, bad arity, type mismatches)
/// never reach this type; they are answered on the wire and the
/// connection stays open.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Reading the snapshot or append-only log during startup failed.
    #[error("recovery failed: {0}")]
    Recovery(#[from] io::Error),

    /// A follower was started without a master address.
    #[error("running as a follower requires --master-addr")]
    MissingMasterAddr,

    /// The follower could not establish its replication link.
    #[error("failed to connect to master {addr}: {source}")]
    MasterConnect {
        addr: String,
        #[source]
        source: io::Error,
    },
}
