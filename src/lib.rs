//! pit - content-addressable file vault
//!
//! protects files from accidental loss by moving them into a
//! deduplicated, read-only object store keyed by content hash, with an
//! append-only index recording the original location and permissions.
//!
//! # Core concepts
//!
//! - **Object**: a file's bytes, stored once under its SHA-256
//!   fingerprint at `<store>/<2 hex chars>/<62 hex chars>`, locked
//!   read-only
//! - **Entry**: one index record of `(mode, fingerprint, relative path)`
//! - **Index**: the append-only log mapping paths to objects
//! - **Location**: an object store address, local path or `host:path`,
//!   served by the same transport calls either way
//!
//! # Example usage
//!
//! ```no_run
//! use pit::{ops, Repo};
//! use std::path::Path;
//!
//! // initialize a repository
//! let mut repo = Repo::init(Path::new("/path/to/vault")).unwrap();
//!
//! // archive a file or directory
//! ops::add(&mut repo, Path::new("/path/to/vault/data")).unwrap();
//!
//! // restore it after a deletion
//! ops::checkout(&repo, Path::new("data")).unwrap();
//! ```

mod config;
mod error;
mod hash;
mod index;
mod location;
mod repo;

pub mod object;
pub mod ops;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use hash::{hash_bytes, hash_file, Hash};
pub use index::{Entry, Index};
pub use location::Location;
pub use repo::{find_root, PolicyViolation, Repo, RepoLock, REPO_DIR};
