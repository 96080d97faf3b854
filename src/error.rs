use std::path::PathBuf;

use crate::Hash;

/// error type for pit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no pit repository found above {0}")]
    NoRepo(PathBuf),

    #[error("repository already exists at {0}")]
    RepoExists(PathBuf),

    #[error("index unavailable at {location}: {message}")]
    IndexUnavailable { location: String, message: String },

    #[error("path not found in index: {0}")]
    PathNotFound(String),

    #[error("content of {path} already archived as {hash}")]
    DuplicateContent { path: PathBuf, hash: Hash },

    #[error("duplicate name in index: {0}")]
    DuplicatePath(String),

    #[error("entry not representable in index format: {0}")]
    UnsafeEntry(String),

    #[error("malformed index line: {0}")]
    IndexParse(String),

    #[error("object not found: {0}")]
    ObjectNotFound(Hash),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("integrity check failed: {0} problem(s) found")]
    Unhealthy(usize),

    #[error("lock contention on repository")]
    LockContention,

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
