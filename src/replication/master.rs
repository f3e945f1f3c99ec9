// =====================================================================
// File: replication/master.rs
//
// Description:
//   Master-side replication. Committed writes are enqueued (under the
//   keyspace lock) onto an unbounded in-memory FIFO; a dedicated
//   sender thread drains the queue and writes each entry to every
//   registered follower socket, one newline-terminated record per
//   mutation so the follower can parse the stream line by line even
//   when the kernel batches sends. A follower whose socket errors is
//   dropped from the set.
// =====================================================================

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// The set of follower sockets registered with this master.
#[derive(Debug, Default)]
pub struct FollowerRegistry {
    followers: Mutex<Vec<TcpStream>>,
}

impl FollowerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            followers: Mutex::new(Vec::new()),
        }
    }

    /// Add a follower socket to the fan-out set.
    pub fn register(&self, stream: TcpStream) {
        let mut followers = self.followers.lock();
        followers.push(stream);
        info!(count = followers.len(), "follower registered");
    }

    /// Number of currently registered followers.
    pub fn count(&self) -> usize {
        self.followers.lock().len()
    }

    /// Write one entry, newline-framed, to every follower. Sockets
    /// that fail are dropped from the set; their follower has lost the
    /// stream and must be rebuilt by the operator.
    pub fn broadcast(&self, entry: &str) {
        let framed = format!("{entry}\n");
        let mut followers = self.followers.lock();
        followers.retain_mut(|socket| match socket.write_all(framed.as_bytes()) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "dropping follower after failed send");
                false
            }
        });
    }
}

/// Producer handle for the replication queue. Cloned into the
/// executor; enqueueing never blocks.
#[derive(Debug, Clone)]
pub struct ReplicationQueue {
    tx: Sender<String>,
}

impl ReplicationQueue {
    /// Enqueue one committed mutation for fan-out.
    pub fn enqueue(&self, entry: &str) {
        // The receiver lives for the process lifetime; a send can only
        // fail during shutdown, when delivery no longer matters.
        if self.tx.send(entry.to_string()).is_err() {
            debug!(entry, "replication sender gone; entry dropped");
        }
    }
}

/// Start the sender thread draining the queue into the registry.
///
/// Returns the producer handle the executor enqueues onto. The thread
/// preserves commit order: one FIFO, one drainer.
pub fn spawn_sender(registry: Arc<FollowerRegistry>) -> ReplicationQueue {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for entry in rx {
            debug!(entry = entry.as_str(), "replicating mutation");
            registry.broadcast(&entry);
        }
    });
    ReplicationQueue { tx }
}
