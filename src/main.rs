// =====================================================================
// File: main.rs
//
// Description:
//   Entry point for the key/value server. Parses the startup
//   configuration, installs the log subscriber, recovers persisted
//   state, and serves until the process is terminated. Exits non-zero
//   when the listen socket cannot be bound, a follower is missing its
//   master address, or recovery hits a fatal I/O error.
// =====================================================================

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kvserver::{Config, Server};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = Server::new(config).context("failed to start server")?;
    server.run().context("server terminated")
}
