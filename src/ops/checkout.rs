//! the checkout operation: restore an archived file

use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, IoResultExt, Result};
use crate::object;
use crate::repo::Repo;

/// restore a file from the store to its original location
///
/// the path may be absolute or relative to the repository root's
/// parent. an unknown path is an error; nothing is written in that
/// case. on success the restored file carries the entry's recorded
/// permission bits. read-only entries restore via hardlink from a
/// local store, bringing the original inode relationship back;
/// entries recorded with write bits come out as a copy, since a
/// chmod through a shared inode would unlock the stored object.
pub fn checkout(repo: &Repo, filename: &Path) -> Result<PathBuf> {
    let rel = relative_form(repo, filename)?;
    debug!(path = %rel, "checking out");

    let entry = repo
        .index()
        .by_path(&rel)
        .ok_or_else(|| Error::PathNotFound(rel.clone()))?;

    let dest = repo.parent_dir().join(&entry.path);
    if entry.mode & 0o222 != 0 {
        object::fetch_copy(repo.store(), &entry.hash, &dest)?;
    } else {
        object::fetch(repo.store(), &entry.hash, &dest)?;
    }
    fs::set_permissions(&dest, Permissions::from_mode(entry.mode & 0o7777)).with_path(&dest)?;

    info!(path = %dest.display(), "checked out");
    Ok(dest)
}

/// the index-relative form of a checkout argument
fn relative_form(repo: &Repo, filename: &Path) -> Result<String> {
    let rel = if filename.is_absolute() {
        filename
            .strip_prefix(repo.parent_dir())
            .map_err(|_| Error::PathNotFound(filename.display().to_string()))?
    } else {
        filename
    };
    Ok(rel.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;
    use tempfile::tempdir;

    use crate::hash::hash_bytes;
    use crate::object;
    use crate::ops::{add, verify};

    #[test]
    fn test_checkout_keeps_object_read_only() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        fs::set_permissions(&file, Permissions::from_mode(0o644)).unwrap();

        add(&mut repo, &file).unwrap();
        fs::remove_file(&file).unwrap();

        checkout(&repo, Path::new("a.txt")).unwrap();
        assert_eq!(fs::metadata(&file).unwrap().mode() & 0o777, 0o644);

        // the restored file is a copy, so the stored object stays locked
        let obj = object::object_location(repo.store(), &hash_bytes(b"hello"));
        let obj_meta = fs::metadata(obj.as_local().unwrap()).unwrap();
        assert_eq!(obj_meta.mode() & 0o222, 0);
        assert_ne!(obj_meta.ino(), fs::metadata(&file).unwrap().ino());
        assert!(verify(&repo).unwrap().is_ok());
    }

    #[test]
    fn test_checkout_read_only_entry_restores_hardlink() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        fs::set_permissions(&file, Permissions::from_mode(0o444)).unwrap();

        add(&mut repo, &file).unwrap();
        fs::remove_file(&file).unwrap();

        checkout(&repo, Path::new("a.txt")).unwrap();

        let obj = object::object_location(repo.store(), &hash_bytes(b"hello"));
        let obj_meta = fs::metadata(obj.as_local().unwrap()).unwrap();
        assert_eq!(obj_meta.ino(), fs::metadata(&file).unwrap().ino());
        assert_eq!(fs::metadata(&file).unwrap().mode() & 0o777, 0o444);
        assert!(verify(&repo).unwrap().is_ok());
    }

    #[test]
    fn test_checkout_restores_content_and_mode() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        fs::set_permissions(&file, Permissions::from_mode(0o640)).unwrap();

        add(&mut repo, &file).unwrap();
        fs::remove_file(&file).unwrap();
        assert!(!file.exists());

        let restored = checkout(&repo, Path::new("a.txt")).unwrap();
        assert_eq!(restored, file);
        assert_eq!(fs::read_to_string(&file).unwrap(), "hello");
        assert_eq!(fs::metadata(&file).unwrap().mode() & 0o777, 0o640);
    }

    #[test]
    fn test_checkout_accepts_absolute_path() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        add(&mut repo, &file).unwrap();
        fs::remove_file(&file).unwrap();

        // tempdir paths may traverse symlinks; use the repo's own view
        let absolute = repo.parent_dir().join("a.txt");
        checkout(&repo, &absolute).unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_checkout_restores_into_subdirectory() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let file = work.join("a.txt");
        fs::write(&file, "nested").unwrap();

        add(&mut repo, &file).unwrap();
        fs::remove_file(&file).unwrap();
        fs::remove_dir(&work).unwrap();

        // parent directories are recreated on the way out
        checkout(&repo, Path::new("work/a.txt")).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "nested");
    }

    #[test]
    fn test_checkout_unknown_path_is_an_error() {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();

        let result = checkout(&repo, Path::new("nope.txt"));
        assert!(matches!(result, Err(Error::PathNotFound(_))));

        // and nothing was written
        assert!(!dir.path().join("nope.txt").exists());
    }
}
