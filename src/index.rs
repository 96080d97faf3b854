//! append-only index: the map from path to stored object
//!
//! one entry per line, `<mode> <fingerprint> <relative-path>`, trailing
//! newline. entries are never removed or rewritten; the in-memory view
//! is loaded once per session and kept in lockstep with the durable log.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::location::Location;
use crate::transport;

/// one index record: permission mode, content fingerprint, and the
/// path relative to the repository root's parent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// full st_mode bits, stored in decimal
    pub mode: u32,
    pub hash: Hash,
    pub path: String,
}

impl Entry {
    /// build an entry, rejecting paths the line format cannot represent
    ///
    /// the format is whitespace-separated and entries are replayed
    /// through a remote shell, so paths containing whitespace, control
    /// characters, or shell quoting characters are refused outright
    /// rather than written corrupted.
    pub fn new(mode: u32, hash: Hash, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() || !path_is_representable(&path) {
            return Err(Error::UnsafeEntry(path));
        }
        Ok(Self { mode, hash, path })
    }

    /// parse one index line
    pub fn parse(line: &str) -> Result<Self> {
        let mut fields = line.split_whitespace();
        let (mode, hash, path) = match (fields.next(), fields.next(), fields.next()) {
            (Some(m), Some(h), Some(p)) => (m, h, p),
            _ => return Err(Error::IndexParse(line.to_string())),
        };
        if fields.next().is_some() {
            return Err(Error::IndexParse(line.to_string()));
        }

        let mode: u32 = mode
            .parse()
            .map_err(|_| Error::IndexParse(line.to_string()))?;
        let hash = Hash::from_hex(hash).map_err(|_| Error::IndexParse(line.to_string()))?;

        Ok(Self {
            mode,
            hash,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.mode, self.hash, self.path)
    }
}

fn path_is_representable(path: &str) -> bool {
    !path
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '\'' | '"' | '`' | '\\'))
}

/// in-memory cached view of the append-only log
///
/// lookups go through maps built at load time and updated on append,
/// never by rescanning the entry list. on duplicate lines (which the
/// add operation prevents) the first occurrence wins.
pub struct Index {
    location: Location,
    entries: Vec<Entry>,
    by_hash: HashMap<Hash, usize>,
    by_path: HashMap<String, usize>,
}

impl Index {
    /// load the index from its location
    ///
    /// remote indexes are staged at `staging` before the first read of
    /// a session. an unreadable index is `IndexUnavailable`.
    pub fn load(location: Location, staging: &Path) -> Result<Self> {
        let lines =
            transport::read_lines(&location, staging).map_err(|e| Error::IndexUnavailable {
                location: location.to_string(),
                message: e.to_string(),
            })?;

        let mut index = Self {
            location,
            entries: Vec::new(),
            by_hash: HashMap::new(),
            by_path: HashMap::new(),
        };
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let entry = Entry::parse(&line)?;
            index.push(entry);
        }
        Ok(index)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// look up an entry by content fingerprint
    pub fn by_hash(&self, hash: &Hash) -> Option<&Entry> {
        self.by_hash.get(hash).map(|&i| &self.entries[i])
    }

    /// look up an entry by relative path
    pub fn by_path(&self, path: &str) -> Option<&Entry> {
        self.by_path.get(path).map(|&i| &self.entries[i])
    }

    /// append an entry to the durable log, then to the cache
    ///
    /// the cache is only updated once the write-through succeeded, so
    /// the two can never diverge; a failed append leaves both untouched.
    pub fn append(&mut self, entry: Entry) -> Result<()> {
        transport::append(&self.location, &entry.to_string())?;
        self.push(entry);
        Ok(())
    }

    fn push(&mut self, entry: Entry) {
        let i = self.entries.len();
        self.by_hash.entry(entry.hash).or_insert(i);
        self.by_path.entry(entry.path.clone()).or_insert(i);
        self.entries.push(entry);
    }
}
