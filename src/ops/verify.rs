//! integrity check over the index and object store

use std::fs;
use std::os::unix::fs::MetadataExt;

use tracing::debug;

use crate::error::{IoResultExt, Result};
use crate::index::Entry;
use crate::object;
use crate::repo::Repo;

/// result of a verify run
#[derive(Debug, Default)]
pub struct VerifyReport {
    pub entries_checked: usize,
    /// entries whose object is missing from the store
    pub missing_objects: Vec<Entry>,
    /// local objects that lost their write protection
    pub writable_objects: Vec<Entry>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.missing_objects.is_empty() && self.writable_objects.is_empty()
    }
}

/// walk every index entry and check its object
///
/// every completed add must have left an object behind; a missing one
/// means the store was tampered with or a foreign index was pointed at
/// it. local objects are additionally checked for the read-only lock.
pub fn verify(repo: &Repo) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    for entry in repo.index().entries() {
        report.entries_checked += 1;
        debug!(%entry, "verifying");

        if !object::exists(repo.store(), &entry.hash)? {
            report.missing_objects.push(entry.clone());
            continue;
        }

        if let Some(path) = object::object_location(repo.store(), &entry.hash).as_local() {
            let mode = fs::metadata(path).with_path(path)?.mode();
            if mode & 0o222 != 0 {
                report.writable_objects.push(entry.clone());
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    use crate::ops::add;

    #[test]
    fn test_verify_healthy_repo() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        add(&mut repo, &file).unwrap();

        let report = verify(&repo).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.entries_checked, 1);
    }

    #[test]
    fn test_verify_reports_missing_object() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        add(&mut repo, &file).unwrap();

        let entry = repo.index().entries()[0].clone();
        let object_path = object::object_location(repo.store(), &entry.hash)
            .as_local()
            .unwrap()
            .to_path_buf();
        fs::set_permissions(&object_path, Permissions::from_mode(0o644)).unwrap();
        fs::remove_file(&object_path).unwrap();

        let report = verify(&repo).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.missing_objects, vec![entry]);
    }

    #[test]
    fn test_verify_reports_writable_object() {
        let dir = tempdir().unwrap();
        let mut repo = Repo::init(dir.path()).unwrap();

        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        add(&mut repo, &file).unwrap();

        let object_path = object::object_location(repo.store(), &repo.index().entries()[0].hash)
            .as_local()
            .unwrap()
            .to_path_buf();
        fs::set_permissions(&object_path, Permissions::from_mode(0o644)).unwrap();

        let report = verify(&repo).unwrap();
        assert_eq!(report.writable_objects.len(), 1);
        assert!(report.missing_objects.is_empty());
    }
}
