//! object store: sharded, immutable, deduplicated blobs
//!
//! one object per distinct fingerprint, stored at
//! `<store>/<first 2 hex chars>/<remaining 62 hex chars>` to avoid
//! directory fan-out. objects are written once, locked read-only, and
//! never mutated afterwards.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::location::Location;
use crate::transport;

/// the shard location of a fingerprint inside the store
pub fn object_location(store: &Location, hash: &Hash) -> Location {
    let (dir, file) = hash.to_path_components();
    store.join(dir).join(file)
}

/// check whether the store holds an object for this fingerprint
pub fn exists(store: &Location, hash: &Hash) -> Result<bool> {
    transport::exists(&object_location(store, hash))
}

/// move a local file into the store under its fingerprint
///
/// a no-op when the object is already present; an orphan left by a
/// crash between put and index append is picked up here when the add
/// is re-run.
pub fn put(store: &Location, hash: &Hash, src: &Path) -> Result<()> {
    let dst = object_location(store, hash);
    if transport::exists(&dst)? {
        debug!(%hash, "object already present, skipping store");
        return Ok(());
    }
    transport::store(src, &dst)
}

/// bring an object back out of the store to a local path
///
/// local stores hardlink, so the restored path shares the object's
/// inode and its read-only bits.
pub fn fetch(store: &Location, hash: &Hash, dst: &Path) -> Result<()> {
    map_missing(hash, transport::fetch(&object_location(store, hash), dst))
}

/// bring an object out as an independent copy
///
/// the copy's permissions can be changed freely without unlocking the
/// stored object.
pub fn fetch_copy(store: &Location, hash: &Hash, dst: &Path) -> Result<()> {
    map_missing(hash, transport::fetch_copy(&object_location(store, hash), dst))
}

fn map_missing(hash: &Hash, result: Result<()>) -> Result<()> {
    match result {
        Err(Error::Io { ref source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            Err(Error::ObjectNotFound(*hash))
        }
        other => other,
    }
}
