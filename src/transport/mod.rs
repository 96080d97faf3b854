//! transport layer: same call shape for local and remote stores
//!
//! every repository operation goes through these four verbs. a
//! [`Location`] was classified as local or remote when the config was
//! parsed, so dispatch here is a match, not a string inspection.
//! failures are fatal to the calling operation and never retried.

pub mod local;
pub mod ssh;

use std::path::Path;

use crate::error::Result;
use crate::location::Location;

/// move a local file into the store at `dst`
///
/// local destinations get a hardlink (copy across devices) and both
/// paths are locked read-only. remote destinations get the parent
/// directory created, the bytes copied, and the remote copy locked
/// read-only; the local source is left untouched.
pub fn store(src: &Path, dst: &Location) -> Result<()> {
    match dst {
        Location::Local(path) => local::store(src, path),
        Location::Remote { host, path } => ssh::store(src, host, path),
    }
}

/// bring a stored file back out to a local path
///
/// local sources are hardlinked, so the restored file shares the
/// stored inode.
pub fn fetch(src: &Location, dst: &Path) -> Result<()> {
    match src {
        Location::Local(path) => local::fetch(path, dst),
        Location::Remote { host, path } => ssh::fetch(host, path, dst),
    }
}

/// bring a stored file back out as an independent copy
///
/// used when the destination's permissions will diverge from the
/// stored file's; a hardlink would carry the change back into the
/// store. remote sources always copy.
pub fn fetch_copy(src: &Location, dst: &Path) -> Result<()> {
    match src {
        Location::Local(path) => local::fetch_copy(path, dst),
        Location::Remote { host, path } => ssh::fetch(host, path, dst),
    }
}

/// append one line to the file at `dst`
///
/// the caller guarantees `line` contains no line breaks; index entries
/// are validated before they reach this point.
pub fn append(dst: &Location, line: &str) -> Result<()> {
    match dst {
        Location::Local(path) => local::append(path, line),
        Location::Remote { host, path } => ssh::append(host, path, line),
    }
}

/// read the raw line sequence of the file at `src`
///
/// remote files are copied to `staging` before the read, so one pull
/// serves every lookup of an in-memory session.
pub fn read_lines(src: &Location, staging: &Path) -> Result<Vec<String>> {
    match src {
        Location::Local(path) => local::read_lines(path),
        Location::Remote { host, path } => ssh::read_lines(host, path, staging),
    }
}

/// check whether a file exists at `loc`
pub fn exists(loc: &Location) -> Result<bool> {
    match loc {
        Location::Local(path) => Ok(path.exists()),
        Location::Remote { host, path } => ssh::exists(host, path),
    }
}
