// =====================================================================
// File: config.rs
//
// Description:
//   Startup surface for the server binary. A master listens on 6381 by
//   default; a follower listens on 6382 and must be given the master
//   address it replicates from. Data file locations are configurable so
//   several instances can share a machine without clobbering each
//   other's logs.
// =====================================================================

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::ServerError;

/// Whether this instance accepts writes or replays a master's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Master,
    Follower,
}

/// Runtime configuration, parsed from the command line.
///
/// # Example
/// ```
/// use kvserver::{Config, Role};
///
/// let config = Config {
///     host: "127.0.0.1".into(),
///     port: None,
///     role: Role::Master,
///     master_addr: None,
///     snapshot_interval: 60,
///     expire_interval: 1,
///     aof_file: "redis_aof.log".into(),
///     snapshot_file: "redis_snapshot.txt".into(),
/// };
/// assert_eq!(config.listen_addr(), "127.0.0.1:6381");
/// ```
#[derive(Parser, Debug, Clone)]
#[command(name = "kvserver", version, about = "In-memory key/value server with TTL, transactions and replication")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Listen port. Defaults to 6381 for a master, 6382 for a follower.
    #[arg(long)]
    pub port: Option<u16>,

    /// Run as the single master or as a replicating follower.
    #[arg(long, value_enum, default_value = "master")]
    pub role: Role,

    /// Master address (host:port). Required when running as a follower.
    #[arg(long)]
    pub master_addr: Option<String>,

    /// Seconds between automatic snapshots.
    #[arg(long, default_value_t = 60)]
    pub snapshot_interval: u64,

    /// Seconds between TTL expiry sweeps.
    #[arg(long, default_value_t = 1)]
    pub expire_interval: u64,

    /// Append-only command log location.
    #[arg(long, default_value = "redis_aof.log")]
    pub aof_file: PathBuf,

    /// Snapshot file location.
    #[arg(long, default_value = "redis_snapshot.txt")]
    pub snapshot_file: PathBuf,
}

impl Config {
    /// Default listen port for a master instance.
    pub const MASTER_PORT: u16 = 6381;

    /// Default listen port for a follower instance.
    pub const FOLLOWER_PORT: u16 = 6382;

    /// The port this instance listens on, applying the role default
    /// when none was given explicitly.
    pub fn listen_port(&self) -> u16 {
        self.port.unwrap_or(match self.role {
            Role::Master => Self::MASTER_PORT,
            Role::Follower => Self::FOLLOWER_PORT,
        })
    }

    /// The full `host:port` listen address.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.listen_port())
    }

    /// Rejects configurations that cannot run: a follower must know its
    /// master before it can register for the replication stream.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.role == Role::Follower && self.master_addr.is_none() {
            return Err(ServerError::MissingMasterAddr);
        }
        Ok(())
    }
}

// =====================================================================
// Unit Tests for Config
// =====================================================================
