// =====================================================================
// File: replication/follower.rs
//
// Description:
//   Follower-side replication. On startup the follower dials the
//   master, sends the REGISTER token, and spawns an ingestion thread
//   that reads the stream one line at a time and applies each entry
//   through the local executor. Replies are discarded; the follower's
//   own append-only log records the applied mutations so a restart
//   recovers locally, but nothing is re-enqueued for replication.
// =====================================================================

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use crate::command::Executor;
use crate::error::ServerError;

/// Connect to the master, register for the stream, and start the
/// ingestion thread.
///
/// Fails fast when the master is unreachable; once the stream is up,
/// a later disconnect only stops replication (logged), it does not
/// take the follower down.
pub fn start(master_addr: &str, executor: Arc<Executor>) -> Result<(), ServerError> {
    let connect_err = |source| ServerError::MasterConnect {
        addr: master_addr.to_string(),
        source,
    };

    let mut stream = TcpStream::connect(master_addr).map_err(connect_err)?;
    stream.write_all(b"REGISTER\n").map_err(connect_err)?;
    info!(master = master_addr, "registered for replication stream");

    thread::spawn(move || ingest_loop(stream, executor));
    Ok(())
}

// Reads master bytes line by line and drives the executor with the
// reply discarded. One record per line; partial lines are left in the
// buffer until their newline arrives.
fn ingest_loop(stream: TcpStream, executor: Arc<Executor>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                warn!("master closed the replication stream");
                return;
            }
            Ok(_) => {}
            Err(err) => {
                error!(%err, "replication stream read failed");
                return;
            }
        }

        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        debug!(entry, "applying replicated mutation");
        let _ = executor.execute(entry);
    }
}
