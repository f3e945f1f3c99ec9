// =====================================================================
// File: server/mod.rs
//
// Description:
//   The server runtime: binds the listener, recovers state from the
//   snapshot and the append-only log, starts the background workers
//   (TTL expirer, and the replication sender or ingester depending on
//   role), then accepts connections and hands each one to its own
//   worker thread.
//
// Structure:
//   - `connection.rs` : the per-connection read/dispatch/reply loop.
// =====================================================================

pub mod connection;

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::command::Executor;
use crate::config::{Config, Role};
use crate::error::ServerError;
use crate::persistence::{AofLog, Snapshot, SnapshotTimer};
use crate::replication::{self, FollowerRegistry};
use crate::store::Keyspace;
use crate::ttl::spawn_expirer;

use self::connection::handle_connection;

// Everything a connection worker needs, shared behind one Arc.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) keyspace: Arc<Mutex<Keyspace>>,
    pub(crate) executor: Arc<Executor>,
    pub(crate) snapshot: Arc<Snapshot>,
    pub(crate) snapshot_timer: SnapshotTimer,
    pub(crate) registry: Arc<FollowerRegistry>,
}

/// A configured server with its listener bound and state recovered,
/// ready to serve.
pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl Server {
    /// Build the server: validate the configuration, recover state
    /// from the snapshot and the append-only log, and bind the listen
    /// socket. Nothing is served until [`Server::run`].
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config.validate()?;

        let keyspace = Arc::new(Mutex::new(Keyspace::new()));
        let aof = Arc::new(AofLog::new(config.aof_file.clone()));
        let snapshot = Arc::new(Snapshot::new(config.snapshot_file.clone()));
        let registry = Arc::new(FollowerRegistry::new());

        // Only a master fans writes out; a follower's executor has no
        // queue, which is what keeps ingested mutations from being
        // re-replicated.
        let queue = match config.role {
            Role::Master => Some(replication::spawn_sender(Arc::clone(&registry))),
            Role::Follower => None,
        };
        let executor = Arc::new(Executor::new(
            Arc::clone(&keyspace),
            Arc::clone(&aof),
            Arc::clone(&snapshot),
            queue,
        ));

        recover(&keyspace, &snapshot, &aof, &executor)?;

        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        info!(%addr, role = ?config.role, "listening");

        let snapshot_timer = SnapshotTimer::new(Duration::from_secs(config.snapshot_interval));
        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                config,
                keyspace,
                executor,
                snapshot,
                snapshot_timer,
                registry,
            }),
        })
    }

    /// The address the listener is bound to. Useful when the
    /// configuration asked for an ephemeral port.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve forever: start the background workers, then accept
    /// connections and spawn one handler thread per client.
    pub fn run(self) -> Result<(), ServerError> {
        spawn_expirer(
            Arc::clone(&self.shared.keyspace),
            Duration::from_secs(self.shared.config.expire_interval.max(1)),
        );

        if self.shared.config.role == Role::Follower {
            // validate() guaranteed the address is present.
            if let Some(master_addr) = self.shared.config.master_addr.clone() {
                replication::follower::start(&master_addr, Arc::clone(&self.shared.executor))?;
            }
        }

        for stream in self.listener.incoming() {
            match stream {
                Ok(socket) => {
                    let shared = Arc::clone(&self.shared);
                    thread::spawn(move || handle_connection(socket, shared));
                }
                Err(err) => warn!(%err, "failed to accept connection"),
            }
        }
        Ok(())
    }
}

// Startup recovery: snapshot first, then the log, so the log's later
// writes win. Replay drives the normal execution path with
// propagation suppressed.
fn recover(
    keyspace: &Arc<Mutex<Keyspace>>,
    snapshot: &Snapshot,
    aof: &AofLog,
    executor: &Executor,
) -> Result<(), ServerError> {
    let restored = snapshot.load()?;
    let snapshot_entries = restored.len();
    {
        let mut ks = keyspace.lock();
        for (key, value) in restored {
            ks.set(key, value, None);
        }
    }

    let records = aof.replay()?;
    let log_records = records.len();
    for record in &records {
        executor.replay(record);
    }

    info!(snapshot_entries, log_records, "recovery complete");
    Ok(())
}
