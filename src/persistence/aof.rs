// =====================================================================
// File: persistence/aof.rs
//
// Description:
//   Append-only command log. Every applied mutation is written as one
//   plain-text line, the exact form the executor saw, and flushed
//   immediately. On startup the log is replayed through the executor
//   to rebuild state; a missing file means an empty history. The log
//   is never rewritten or compacted.
// =====================================================================

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Handle on the append-only log file.
///
/// The file is opened per append; the handle itself holds no state
/// beyond the path, so it is freely shared behind an `Arc`.
#[derive(Debug)]
pub struct AofLog {
    path: PathBuf,
}

impl AofLog {
    /// Create a handle for the log at `path`. The file is created on
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one mutation record and flush it to disk.
    ///
    /// # Arguments
    /// * `record` - The canonical textual form of the applied command
    ///   (verb and arguments joined by single spaces, no newline).
    pub fn append(&self, record: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{record}")?;
        file.flush()
    }

    /// Read every record back, in append order.
    ///
    /// A missing file yields an empty history; blank lines are skipped.
    pub fn replay(&self) -> io::Result<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                records.push(line);
            }
        }
        Ok(records)
    }
}
