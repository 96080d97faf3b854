use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};
use crate::index::Index;
use crate::location::Location;

/// directory marker anchoring one repository
pub const REPO_DIR: &str = ".pit";

/// a pit repository
///
/// ties together the root directory, configuration, object store
/// location, and index. everything is loaded by the constructors; no
/// field is lazily populated behind an accessor.
pub struct Repo {
    root: PathBuf,
    config: Config,
    store: Location,
    index: Index,
}

impl Repo {
    /// initialize a new repository at the given directory
    ///
    /// creates `<dir>/.pit` with an empty index, an `objects` store
    /// directory, and a config whose `core.url` is the absolute store
    /// path. a repository in an ancestor directory is a warning, not
    /// an error.
    pub fn init(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_path(dir)?;
        let root = repo_root_for(dir)?;
        if root.join("config").exists() {
            return Err(Error::RepoExists(root));
        }
        warn_on_nesting(&root);

        fs::create_dir_all(&root).with_path(&root)?;
        let store_path = root.join("objects");
        fs::create_dir_all(&store_path).with_path(&store_path)?;

        let index_path = root.join("index");
        fs::write(&index_path, "").with_path(&index_path)?;

        let config = Config::new(store_path.display().to_string());
        config.save(&root.join("config"))?;

        Self::open_root(root)
    }

    /// clone an existing repository into a new root
    ///
    /// the new config points `core.url` at the source's object store;
    /// objects are shared, not copied. the source index is fetched
    /// eagerly so lookups resolve immediately.
    pub fn clone_from(source: &str, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_path(dir)?;
        let root = repo_root_for(dir)?;
        if root.join("config").exists() {
            return Err(Error::RepoExists(root));
        }
        warn_on_nesting(&root);

        fs::create_dir_all(&root).with_path(&root)?;

        let store = Location::parse(source).join(REPO_DIR).join("objects");

        // fetch the source index before committing any config, so a
        // failed clone leaves no repository behind
        let index = Index::load(index_location(&store)?, &root.join("index"))?;

        let config = Config::new(store.to_string());
        config.save(&root.join("config"))?;

        Ok(Self {
            root,
            config,
            store,
            index,
        })
    }

    /// open the repository anchored at the given root's parent (or the
    /// root itself)
    pub fn open(dir: &Path) -> Result<Self> {
        let root = repo_root_for(dir)?;
        if !root.join("config").exists() {
            return Err(Error::NoRepo(dir.to_path_buf()));
        }
        Self::open_root(root)
    }

    /// discover and open the repository above the given directory
    pub fn discover(start: &Path) -> Result<Self> {
        Self::open_root(find_root(start)?)
    }

    fn open_root(root: PathBuf) -> Result<Self> {
        let config = Config::load(&root.join("config"))?;
        let store = config.store_location();

        // remote indexes get staged inside the root
        let index = Index::load(index_location(&store)?, &root.join("index"))?;

        Ok(Self {
            root,
            config,
            store,
            index,
        })
    }

    /// the `.pit` directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// the directory the repository anchors; index paths are relative
    /// to this
    pub fn parent_dir(&self) -> &Path {
        self.root.parent().unwrap_or_else(|| Path::new("/"))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// object store location
    pub fn store(&self) -> &Location {
        &self.store
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    /// re-read the index, replacing the cached view
    ///
    /// called under the repository lock so the caller sees records
    /// appended by other writers since this handle was opened.
    pub fn refresh_index(&mut self) -> Result<()> {
        self.index = Index::load(index_location(&self.store)?, &self.root.join("index"))?;
        Ok(())
    }

    /// apply the add safety policy to a candidate file
    ///
    /// the outer error is a filesystem access failure and aborts the
    /// operation; the inner result is the policy decision. accepted
    /// candidates come back fully resolved.
    pub fn verify_file(&self, path: &Path) -> Result<std::result::Result<PathBuf, PolicyViolation>> {
        let meta = fs::symlink_metadata(path).with_path(path)?;
        if meta.file_type().is_symlink() {
            return Ok(Err(PolicyViolation::Symlink));
        }

        let resolved = path.canonicalize().with_path(path)?;
        if resolved.starts_with(&self.root) {
            return Ok(Err(PolicyViolation::InsideRepository));
        }
        if !resolved.starts_with(self.parent_dir()) {
            return Ok(Err(PolicyViolation::OutsideTree));
        }
        Ok(Ok(resolved))
    }

    /// acquire the exclusive repository lock
    ///
    /// serializes the duplicate scan, put and append section of add
    /// across local writers.
    /// returns a guard that releases the lock on drop.
    pub fn lock(&self) -> Result<RepoLock> {
        let lock_path = self.root.join(".lock");
        let file = File::create(&lock_path).with_path(&lock_path)?;

        let flock = Flock::lock(file, FlockArg::LockExclusive).map_err(|_| Error::LockContention)?;

        Ok(RepoLock { flock })
    }
}

/// why the safety policy rejected an add candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyViolation {
    /// the file lives inside the repository root itself
    InsideRepository,
    /// symlinks are never archived
    Symlink,
    /// the file resolves outside the repository root's parent subtree
    OutsideTree,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::InsideRepository => write!(f, "file is inside the repository"),
            PolicyViolation::Symlink => write!(f, "refusing to archive a symlink"),
            PolicyViolation::OutsideTree => {
                write!(f, "file is outside the repository root's parent subtree")
            }
        }
    }
}

/// guard that holds the repository lock until dropped
pub struct RepoLock {
    #[allow(dead_code)]
    flock: Flock<File>,
}
// lock is released automatically when Flock is dropped

/// the index lives next to the object store, in its parent directory
fn index_location(store: &Location) -> Result<Location> {
    store
        .parent()
        .map(|parent| parent.join("index"))
        .ok_or_else(|| Error::IndexUnavailable {
            location: store.to_string(),
            message: "object store has no parent directory".to_string(),
        })
}

/// find the nearest repository root at or above the given directory
pub fn find_root(start: &Path) -> Result<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(REPO_DIR);
        if candidate.is_dir() {
            return candidate.canonicalize().with_path(&candidate);
        }
    }
    Err(Error::NoRepo(start.to_path_buf()))
}

/// normalize `dir` to its repository root, appending `.pit` unless the
/// directory already is one
fn repo_root_for(dir: &Path) -> Result<PathBuf> {
    let dir = if dir.exists() {
        dir.canonicalize().with_path(dir)?
    } else {
        dir.to_path_buf()
    };
    if dir.file_name().map(|n| n == REPO_DIR).unwrap_or(false) {
        Ok(dir)
    } else {
        Ok(dir.join(REPO_DIR))
    }
}

fn warn_on_nesting(new_root: &Path) {
    if let Some(parent) = new_root.parent() {
        if let Ok(existing) = find_root(parent) {
            warn!(
                new = %new_root.display(),
                existing = %existing.display(),
                "nesting repositories, probably bad"
            );
        }
    }
}
