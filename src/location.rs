use std::fmt;
use std::path::{Path, PathBuf};

/// a store location, local or remote
///
/// the remote/local split is decided once, when the configured url is
/// parsed, rather than re-checking strings for a separator at every
/// call site. a string containing `:` is remote, in `host:path` form
/// where host may be `user@host`. this is a structural heuristic, not
/// a protocol handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Remote { host: String, path: PathBuf },
}

impl Location {
    /// parse a location string from config or the command line
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((host, path)) => Location::Remote {
                host: host.to_string(),
                path: PathBuf::from(path),
            },
            None => Location::Local(PathBuf::from(s)),
        }
    }

    /// append a path segment
    pub fn join(&self, segment: impl AsRef<Path>) -> Location {
        match self {
            Location::Local(path) => Location::Local(path.join(segment)),
            Location::Remote { host, path } => Location::Remote {
                host: host.clone(),
                path: path.join(segment),
            },
        }
    }

    /// parent directory of this location, if any
    pub fn parent(&self) -> Option<Location> {
        match self {
            Location::Local(path) => path.parent().map(|p| Location::Local(p.to_path_buf())),
            Location::Remote { host, path } => path.parent().map(|p| Location::Remote {
                host: host.clone(),
                path: p.to_path_buf(),
            }),
        }
    }

    /// the local path, if this location is local
    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Location::Local(path) => Some(path),
            Location::Remote { .. } => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Remote { .. })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote { host, path } => write!(f, "{}:{}", host, path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        let loc = Location::parse("/var/vault/objects");
        assert_eq!(loc, Location::Local(PathBuf::from("/var/vault/objects")));
        assert!(!loc.is_remote());
        assert_eq!(loc.as_local(), Some(Path::new("/var/vault/objects")));
    }

    #[test]
    fn test_parse_remote() {
        let loc = Location::parse("user@backup:/srv/pit/objects");
        assert_eq!(
            loc,
            Location::Remote {
                host: "user@backup".to_string(),
                path: PathBuf::from("/srv/pit/objects"),
            }
        );
        assert!(loc.is_remote());
        assert!(loc.as_local().is_none());
    }

    #[test]
    fn test_join_and_parent() {
        let loc = Location::parse("backup:/srv/pit/objects");
        let shard = loc.join("ab").join("cdef");
        assert_eq!(shard.to_string(), "backup:/srv/pit/objects/ab/cdef");

        let parent = loc.parent().unwrap();
        assert_eq!(parent.to_string(), "backup:/srv/pit");

        let index = parent.join("index");
        assert_eq!(index.to_string(), "backup:/srv/pit/index");
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["/local/store", "host:/remote/store", "a@b:/x"] {
            assert_eq!(Location::parse(s).to_string(), s);
        }
    }
}
