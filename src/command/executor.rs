// =====================================================================
// File: command/executor.rs
//
// Description:
//   Command grammar, parser, and executor. A request line is split on
//   ASCII whitespace with a case-insensitive verb; the executor then
//   applies it to the keyspace while holding the global mutex and
//   produces the reply bytes. Successful writes record their canonical
//   textual form to the append-only log and the replication queue
//   before the mutex is released, so a write acknowledged to a client
//   is durable and ordered ahead of any later write.
//
//   Recovery replays the same path with propagation suppressed, which
//   keeps replayed history from being re-logged or re-replicated.
// =====================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::error;

use crate::persistence::{AofLog, Snapshot};
use crate::replication::ReplicationQueue;
use crate::store::{Keyspace, ValueError};

pub(crate) const OK: &str = "OK\n";
pub(crate) const NIL: &str = "nil\n";
pub(crate) const INVALID_COMMAND: &str = "Invalid command\n";
pub(crate) const INVALID_TTL: &str = "Invalid TTL value\n";
pub(crate) const SNAPSHOT_SAVED: &str = "Data saved to snapshot file\n";
pub(crate) const TXN_UNSUPPORTED: &str = "ERROR: Transaction contains unsupported commands\n";

/// One parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set {
        key: String,
        value: String,
        ttl_secs: Option<u64>,
    },
    Get { key: String },
    Del { key: String },
    Incr { key: String },
    Decr { key: String },
    LPush { key: String, values: Vec<String> },
    RPush { key: String, values: Vec<String> },
    LPop { key: String },
    RPop { key: String },
    LRange { key: String, start: i64, stop: i64 },
    Save,
    Multi,
    Exec,
    Discard,
}

/// Why a request line failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace.
    Empty,
    /// A verb outside the protocol.
    UnknownVerb,
    /// Known verb, wrong argument shape. Carries the verb for the
    /// `Invalid <VERB> command` reply.
    BadArity(&'static str),
    /// `SET ... EX` with a tail that is not a non-negative integer.
    BadTtl,
}

impl ParseError {
    /// The wire reply for this parse failure.
    pub fn reply(&self) -> String {
        match self {
            ParseError::Empty | ParseError::UnknownVerb => INVALID_COMMAND.to_string(),
            ParseError::BadArity(verb) => format!("Invalid {verb} command\n"),
            ParseError::BadTtl => INVALID_TTL.to_string(),
        }
    }
}

impl Command {
    /// Parse one request line.
    ///
    /// Tokens are split on ASCII whitespace; the verb is
    /// case-insensitive, keys and values are case-sensitive. For `SET`
    /// the value is the space-joined run of tokens between the key and
    /// an optional trailing `EX <seconds>` pair.
    ///
    /// # Example
    /// ```
    /// use kvserver::Command;
    ///
    /// let cmd = Command::parse("set dog bark").unwrap();
    /// assert_eq!(
    ///     cmd,
    ///     Command::Set { key: "dog".into(), value: "bark".into(), ttl_secs: None }
    /// );
    /// ```
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((verb, args)) = tokens.split_first() else {
            return Err(ParseError::Empty);
        };

        match verb.to_ascii_uppercase().as_str() {
            "SET" => Self::parse_set(args),
            "GET" => Self::parse_single_key(args, "GET", |key| Command::Get { key }),
            "DEL" => Self::parse_single_key(args, "DEL", |key| Command::Del { key }),
            "INCR" => Self::parse_single_key(args, "INCR", |key| Command::Incr { key }),
            "DECR" => Self::parse_single_key(args, "DECR", |key| Command::Decr { key }),
            "LPOP" => Self::parse_single_key(args, "LPOP", |key| Command::LPop { key }),
            "RPOP" => Self::parse_single_key(args, "RPOP", |key| Command::RPop { key }),
            "LPUSH" => Self::parse_push(args, "LPUSH", |key, values| Command::LPush { key, values }),
            "RPUSH" => Self::parse_push(args, "RPUSH", |key, values| Command::RPush { key, values }),
            "LRANGE" => Self::parse_lrange(args),
            "SAVE" => Ok(Command::Save),
            "MULTI" => Ok(Command::Multi),
            "EXEC" => Ok(Command::Exec),
            "DISCARD" => Ok(Command::Discard),
            _ => Err(ParseError::UnknownVerb),
        }
    }

    /// Whether this command may appear inside a `MULTI` buffer.
    pub fn transactional(&self) -> bool {
        matches!(
            self,
            Command::Set { .. }
                | Command::Get { .. }
                | Command::Del { .. }
                | Command::LPush { .. }
                | Command::RPush { .. }
                | Command::LPop { .. }
                | Command::RPop { .. }
        )
    }

    fn parse_set(args: &[&str]) -> Result<Self, ParseError> {
        let [key, rest @ ..] = args else {
            return Err(ParseError::BadArity("SET"));
        };
        if rest.is_empty() {
            return Err(ParseError::BadArity("SET"));
        }

        // A trailing `EX <n>` pair is TTL, provided at least one value
        // token remains in front of it.
        if rest.len() >= 3 && rest[rest.len() - 2].eq_ignore_ascii_case("EX") {
            let ttl_secs: u64 = rest[rest.len() - 1].parse().map_err(|_| ParseError::BadTtl)?;
            return Ok(Command::Set {
                key: key.to_string(),
                value: rest[..rest.len() - 2].join(" "),
                ttl_secs: Some(ttl_secs),
            });
        }

        Ok(Command::Set {
            key: key.to_string(),
            value: rest.join(" "),
            ttl_secs: None,
        })
    }

    fn parse_single_key(
        args: &[&str],
        verb: &'static str,
        build: impl FnOnce(String) -> Command,
    ) -> Result<Self, ParseError> {
        match args {
            [key] => Ok(build(key.to_string())),
            _ => Err(ParseError::BadArity(verb)),
        }
    }

    fn parse_push(
        args: &[&str],
        verb: &'static str,
        build: impl FnOnce(String, Vec<String>) -> Command,
    ) -> Result<Self, ParseError> {
        let [key, values @ ..] = args else {
            return Err(ParseError::BadArity(verb));
        };
        if values.is_empty() {
            return Err(ParseError::BadArity(verb));
        }
        Ok(build(
            key.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        ))
    }

    fn parse_lrange(args: &[&str]) -> Result<Self, ParseError> {
        let [key, start, stop] = args else {
            return Err(ParseError::BadArity("LRANGE"));
        };
        let start: i64 = start.parse().map_err(|_| ParseError::BadArity("LRANGE"))?;
        let stop: i64 = stop.parse().map_err(|_| ParseError::BadArity("LRANGE"))?;
        Ok(Command::LRange {
            key: key.to_string(),
            start,
            stop,
        })
    }
}

/// Applies commands to the keyspace and produces wire replies.
///
/// One executor is shared by every connection thread, the recovery
/// path, and (on a follower) the replication ingester. Propagation
/// differs per path:
///
/// * [`Executor::execute`] — live traffic: apply, then log and enqueue
///   the write before releasing the mutex.
/// * [`Executor::replay`] — recovery: apply only.
/// * a follower is built with no replication queue, so its ingester
///   logs to the local append-only file without re-enqueueing.
pub struct Executor {
    keyspace: Arc<Mutex<Keyspace>>,
    aof: Arc<AofLog>,
    snapshot: Arc<Snapshot>,
    replication: Option<ReplicationQueue>,
}

impl Executor {
    /// Wire up an executor over the shared keyspace and durability
    /// handles. `replication` is `Some` only on a master.
    pub fn new(
        keyspace: Arc<Mutex<Keyspace>>,
        aof: Arc<AofLog>,
        snapshot: Arc<Snapshot>,
        replication: Option<ReplicationQueue>,
    ) -> Self {
        Self {
            keyspace,
            aof,
            snapshot,
            replication,
        }
    }

    /// Execute one request line and return the reply bytes.
    pub fn execute(&self, line: &str) -> String {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => return err.reply(),
        };

        match command {
            // Transaction control never reaches the executor from a
            // connection (the per-connection FSM intercepts it); seen
            // here it is outside any transaction and thus invalid.
            Command::Multi | Command::Exec | Command::Discard => INVALID_COMMAND.to_string(),

            Command::Save => {
                let keyspace = self.keyspace.lock();
                if let Err(err) = self.snapshot.save(&keyspace) {
                    error!(%err, "snapshot write failed");
                }
                SNAPSHOT_SAVED.to_string()
            }

            command => {
                let mut keyspace = self.keyspace.lock();
                let (reply, record) = Self::apply(&mut keyspace, &command);
                if let Some(record) = record {
                    self.propagate(&record);
                }
                reply
            }
        }
    }

    /// Execute a transaction buffer as one critical section.
    ///
    /// The whole buffer is validated first; any line that fails to
    /// parse or names a verb transactions do not support aborts the
    /// batch before anything is applied. Otherwise every command runs
    /// in order under a single mutex acquisition and the reply is the
    /// concatenation of the value lines (`GET` always contributes,
    /// `LPOP`/`RPOP` contribute when they pop something).
    pub fn execute_batch(&self, lines: &[String]) -> String {
        let mut commands = Vec::with_capacity(lines.len());
        for line in lines {
            match Command::parse(line) {
                Ok(command) if command.transactional() => commands.push(command),
                _ => return TXN_UNSUPPORTED.to_string(),
            }
        }

        let mut keyspace = self.keyspace.lock();
        let mut output = String::new();
        for command in &commands {
            let (reply, record) = Self::apply(&mut keyspace, command);
            if let Some(record) = record {
                self.propagate(&record);
            }
            match command {
                Command::Get { .. } => output.push_str(&reply),
                Command::LPop { .. } | Command::RPop { .. } if reply != NIL => {
                    output.push_str(&reply);
                }
                _ => {}
            }
        }
        output
    }

    /// Re-apply one recovered log record. No reply, no propagation:
    /// replayed history must not be logged or replicated again.
    pub fn replay(&self, line: &str) {
        let Ok(command) = Command::parse(line) else {
            return;
        };
        if matches!(
            command,
            Command::Save | Command::Multi | Command::Exec | Command::Discard
        ) {
            return;
        }
        let mut keyspace = self.keyspace.lock();
        let _ = Self::apply(&mut keyspace, &command);
    }

    // Mutates the keyspace and builds (reply, canonical record). The
    // record is Some only when a mutation was actually applied, in
    // which case the caller must propagate it before the lock drops.
    fn apply(keyspace: &mut Keyspace, command: &Command) -> (String, Option<String>) {
        match command {
            Command::Set { key, value, ttl_secs } => {
                keyspace.set(
                    key.clone(),
                    value.clone(),
                    ttl_secs.map(Duration::from_secs),
                );
                let record = match ttl_secs {
                    Some(secs) => format!("SET {key} {value} EX {secs}"),
                    None => format!("SET {key} {value}"),
                };
                (OK.to_string(), Some(record))
            }

            Command::Get { key } => match keyspace.get(key) {
                Ok(Some(value)) => (format!("{value}\n"), None),
                Ok(None) => (NIL.to_string(), None),
                Err(err) => (error_reply(err), None),
            },

            Command::Del { key } => {
                if keyspace.del(key) {
                    ("1\n".to_string(), Some(format!("DEL {key}")))
                } else {
                    ("0\n".to_string(), None)
                }
            }

            Command::Incr { key } => match keyspace.incr(key, 1) {
                Ok(Some(value)) => (format!("{value}\n"), Some(format!("INCR {key}"))),
                Ok(None) => ("0\n".to_string(), None),
                Err(err) => (error_reply(err), None),
            },

            Command::Decr { key } => match keyspace.incr(key, -1) {
                Ok(Some(value)) => (format!("{value}\n"), Some(format!("DECR {key}"))),
                Ok(None) => ("0\n".to_string(), None),
                Err(err) => (error_reply(err), None),
            },

            Command::LPush { key, values } => match keyspace.push_front(key, values.clone()) {
                Ok(_) => (
                    OK.to_string(),
                    Some(format!("LPUSH {key} {}", values.join(" "))),
                ),
                Err(err) => (error_reply(err), None),
            },

            Command::RPush { key, values } => match keyspace.push_back(key, values.clone()) {
                Ok(_) => (
                    OK.to_string(),
                    Some(format!("RPUSH {key} {}", values.join(" "))),
                ),
                Err(err) => (error_reply(err), None),
            },

            Command::LPop { key } => match keyspace.pop_front(key) {
                Ok(Some(value)) => (format!("{value}\n"), Some(format!("LPOP {key}"))),
                Ok(None) => (NIL.to_string(), None),
                Err(err) => (error_reply(err), None),
            },

            Command::RPop { key } => match keyspace.pop_back(key) {
                Ok(Some(value)) => (format!("{value}\n"), Some(format!("RPOP {key}"))),
                Ok(None) => (NIL.to_string(), None),
                Err(err) => (error_reply(err), None),
            },

            Command::LRange { key, start, stop } => match keyspace.range(key, *start, *stop) {
                Some(values) => (format!("{}\n", values.join(" ")), None),
                None => ("Invalid LRANGE command\n".to_string(), None),
            },

            // Handled before apply; unreachable by construction.
            Command::Save | Command::Multi | Command::Exec | Command::Discard => {
                (INVALID_COMMAND.to_string(), None)
            }
        }
    }

    // Records one committed write. Called with the keyspace lock held
    // so the log and queue observe mutations in commit order. An
    // append failure is logged and does not roll back the mutation.
    fn propagate(&self, record: &str) {
        if let Err(err) = self.aof.append(record) {
            error!(%err, record, "append-only log write failed");
        }
        if let Some(queue) = &self.replication {
            queue.enqueue(record);
        }
    }
}

// Formats a typed-access failure as an inline wire error.
fn error_reply(err: ValueError) -> String {
    format!("ERROR: {err}\n")
}
