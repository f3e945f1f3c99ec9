// =====================================================================
// File: transaction/transaction.rs
//
// Description:
//   Per-connection transaction state machine. Between MULTI and
//   EXEC/DISCARD the connection buffers raw command lines instead of
//   executing them; EXEC hands the buffer to the executor's batch
//   path, which runs it as one critical section. Dropping the state
//   (client disconnect) discards an open buffer without executing it.
// =====================================================================

pub(crate) const TXN_OK: &str = "OK\n";
pub(crate) const TXN_NESTED: &str = "ERROR: Nested transactions are not supported\n";

/// Transaction state for one connection: `Idle` when the buffer is
/// `None`, `InTxn` while it holds queued command lines.
///
/// # Example
/// ```
/// use kvserver::Transaction;
///
/// let mut txn = Transaction::new();
/// assert!(!txn.in_txn());
/// assert_eq!(txn.begin(), "OK\n");
/// txn.queue("LPUSH l 1");
/// assert_eq!(txn.queued_count(), 1);
/// assert_eq!(txn.take(), vec!["LPUSH l 1".to_string()]);
/// assert!(!txn.in_txn());
/// ```
#[derive(Debug, Default)]
pub struct Transaction {
    buffer: Option<Vec<String>>,
}

impl Transaction {
    /// Start in the idle state.
    pub fn new() -> Self {
        Self { buffer: None }
    }

    /// Whether a transaction is open on this connection.
    pub fn in_txn(&self) -> bool {
        self.buffer.is_some()
    }

    /// Handle `MULTI`.
    ///
    /// Opens a fresh buffer when idle. A nested `MULTI` is rejected
    /// and the open buffer is preserved untouched.
    pub fn begin(&mut self) -> &'static str {
        if self.buffer.is_some() {
            return TXN_NESTED;
        }
        self.buffer = Some(Vec::new());
        TXN_OK
    }

    /// Buffer one raw command line. No reply is produced for queued
    /// commands. Outside a transaction this is a no-op.
    pub fn queue(&mut self, line: &str) {
        if let Some(buffer) = &mut self.buffer {
            buffer.push(line.to_string());
        }
    }

    /// Handle `EXEC`: close the transaction and hand back the buffered
    /// lines in queue order.
    pub fn take(&mut self) -> Vec<String> {
        self.buffer.take().unwrap_or_default()
    }

    /// Handle `DISCARD`: drop the buffer without executing anything.
    pub fn discard(&mut self) -> &'static str {
        self.buffer = None;
        TXN_OK
    }

    /// Number of commands waiting in the open buffer.
    pub fn queued_count(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }
}
