// =====================================================================
// File: server/connection.rs
//
// Description:
//   Per-connection worker loop. Reads newline-terminated commands,
//   routes them through the connection's transaction state machine or
//   the shared executor, writes the reply, and triggers the periodic
//   snapshot when the interval has elapsed. The loop ends on
//   disconnect (empty read) or I/O error; an open transaction buffer
//   is dropped with the worker, unexecuted.
//
//   On a master, a line consisting of the REGISTER token adds this
//   socket to the follower set and the loop keeps serving it.
//   On a follower, external mutation commands are refused; the only
//   write path into a follower is the replication stream.
// =====================================================================

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::command::executor::INVALID_COMMAND;
use crate::config::Role;
use crate::transaction::Transaction;

use super::Shared;

const FOLLOWER_READ_ONLY: &str = "ERROR: Cannot write to a follower\n";

/// Serve one client until it disconnects.
pub(crate) fn handle_connection(stream: TcpStream, shared: Arc<Shared>) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".into());
    debug!(peer, "connection opened");

    let reader_stream = match stream.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            error!(%err, peer, "failed to clone client socket");
            return;
        }
    };
    let mut reader = BufReader::new(reader_stream);
    let mut writer = stream;
    let mut txn = Transaction::new();
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // client closed the connection
            Ok(_) => {}
            Err(err) => {
                error!(%err, peer, "read failed");
                break;
            }
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        // Follower registration: claim the socket for the fan-out set
        // and keep serving the connection.
        if request == "REGISTER" && shared.config.role == Role::Master {
            match writer.try_clone() {
                Ok(socket) => {
                    shared.registry.register(socket);
                    info!(peer, "registered follower");
                }
                Err(err) => error!(%err, peer, "failed to claim follower socket"),
            }
            continue;
        }

        if let Some(reply) = dispatch(request, &mut txn, &shared) {
            if !reply.is_empty() {
                if let Err(err) = writer.write_all(reply.as_bytes()) {
                    error!(%err, peer, "write failed");
                    break;
                }
            }
        }

        maybe_snapshot(&shared);
    }

    debug!(peer, "connection closed");
}

// Routes one request. `None` means no reply bytes at all (a command
// queued into an open transaction).
fn dispatch(request: &str, txn: &mut Transaction, shared: &Shared) -> Option<String> {
    let verb = request
        .split_ascii_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();

    match verb.as_str() {
        "MULTI" => {
            if shared.config.role == Role::Follower {
                return Some(FOLLOWER_READ_ONLY.to_string());
            }
            Some(txn.begin().to_string())
        }
        "EXEC" => {
            if txn.in_txn() {
                let buffered = txn.take();
                Some(shared.executor.execute_batch(&buffered))
            } else {
                Some(INVALID_COMMAND.to_string())
            }
        }
        "DISCARD" => {
            if txn.in_txn() {
                Some(txn.discard().to_string())
            } else {
                Some(INVALID_COMMAND.to_string())
            }
        }
        _ if txn.in_txn() => {
            txn.queue(request);
            None
        }
        _ => {
            if shared.config.role == Role::Follower && is_write_verb(&verb) {
                return Some(FOLLOWER_READ_ONLY.to_string());
            }
            Some(shared.executor.execute(request))
        }
    }
}

// Writes a snapshot when the interval has elapsed since the last one.
// Runs after every dispatched command, on whichever connection gets
// there first.
fn maybe_snapshot(shared: &Shared) {
    if !shared.snapshot_timer.due() {
        return;
    }
    let keyspace = shared.keyspace.lock();
    match shared.snapshot.save(&keyspace) {
        Ok(entries) => debug!(entries, "periodic snapshot written"),
        Err(err) => error!(%err, "periodic snapshot failed"),
    }
    shared.snapshot_timer.mark();
}

// The mutation verbs a follower refuses from external clients.
fn is_write_verb(verb: &str) -> bool {
    matches!(
        verb,
        "SET" | "DEL" | "INCR" | "DECR" | "LPUSH" | "RPUSH" | "LPOP" | "RPOP"
    )
}
