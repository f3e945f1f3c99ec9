// =====================================================================
// File: persistence/snapshot.rs
//
// Description:
//   Point-in-time dump of the keyspace's string entries, one
//   `SET key value` line each. Lists and TTLs are not part of the
//   format; the append-only log carries those through recovery. The
//   file is truncated and rewritten in full on every save.
// =====================================================================

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::store::Keyspace;

/// Handle on the snapshot file.
#[derive(Debug)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    /// Create a handle for the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current string entries, replacing any previous file.
    ///
    /// The caller holds the keyspace lock, so the dump is a consistent
    /// point-in-time view.
    ///
    /// # Returns
    /// The number of entries written.
    pub fn save(&self, keyspace: &Keyspace) -> io::Result<usize> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        let mut written = 0;
        for (key, value) in keyspace.string_entries() {
            writeln!(writer, "SET {key} {value}")?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }

    /// Read the snapshot back as `(key, value)` pairs.
    ///
    /// Lines with fewer than three whitespace tokens or a non-`SET`
    /// leader are ignored. A missing file yields no entries.
    pub fn load(&self) -> io::Result<Vec<(String, String)>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 && parts[0] == "SET" {
                entries.push((parts[1].to_string(), parts[2..].join(" ")));
            }
        }
        Ok(entries)
    }
}
