//! the add operation: archive files into the store

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::hash_file;
use crate::index::Entry;
use crate::object;
use crate::repo::Repo;

/// what an add run did
///
/// directory adds make partial progress: rejected files are skipped
/// with a logged reason while the rest are archived.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: usize,
    pub skipped: usize,
}

/// archive a file, or every eligible file under a directory
///
/// per-file policy and duplicate rejections degrade to a skip plus a
/// warning; transport and io failures abort the whole operation.
pub fn add(repo: &mut Repo, path: &Path) -> Result<AddOutcome> {
    info!(path = %path.display(), "adding");

    let mut outcome = AddOutcome::default();
    for file in collect_candidates(path)? {
        match add_one(repo, &file) {
            Ok(true) => outcome.added += 1,
            Ok(false) => outcome.skipped += 1,
            Err(e @ (Error::DuplicateContent { .. } | Error::DuplicatePath(_))) => {
                warn!(error = %e, "skipping");
                outcome.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(outcome)
}

/// enumerate candidate files, recursing into directories and skipping
/// dot-prefixed entries with a warning each
fn collect_candidates(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::symlink_metadata(path).with_path(path)?;
    if !meta.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
            if hidden {
                warn!(path = %e.path().display(), "skipping hidden entry");
            }
            !hidden
        });

    for entry in walker {
        let entry = entry.map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        // symlinks pass through so the policy check can warn about them
        if entry.file_type().is_file() || entry.file_type().is_symlink() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn add_one(repo: &mut Repo, file: &Path) -> Result<bool> {
    let resolved = match repo.verify_file(file)? {
        Ok(resolved) => resolved,
        Err(violation) => {
            warn!(path = %file.display(), %violation, "skipping");
            return Ok(false);
        }
    };

    // mode is captured before the store chmods the inode read-only
    let mode = fs::metadata(&resolved).with_path(&resolved)?.mode();
    let hash = hash_file(&resolved)?;

    let rel = match resolved.strip_prefix(repo.parent_dir()) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => {
            warn!(path = %file.display(), "skipping, not under repository parent");
            return Ok(false);
        }
    };

    let entry = match Entry::new(mode, hash, rel) {
        Ok(entry) => entry,
        Err(Error::UnsafeEntry(path)) => {
            warn!(%path, "skipping, path not representable in index");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    // the lock is held across scan, put and append; the cached index
    // is re-read under it so the scan sees appends made by another
    // writer since this handle was opened.
    let _lock = repo.lock()?;
    repo.refresh_index()?;

    if repo.index().by_hash(&hash).is_some() {
        return Err(Error::DuplicateContent {
            path: file.to_path_buf(),
            hash,
        });
    }
    if repo.index().by_path(&entry.path).is_some() {
        return Err(Error::DuplicatePath(entry.path));
    }

    info!(%entry, "adding entry");

    // append only runs after the object is durably stored, so the
    // index never points at a missing object. a crash in between
    // leaves an orphan object that the next add run picks up.
    object::put(repo.store(), &hash, &resolved)?;
    repo.index_mut().append(entry)?;
    Ok(true)
}
