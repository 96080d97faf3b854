//! local-filesystem transport

use std::fs::{self, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::debug;

use crate::error::{IoResultExt, Result};

/// read-only for all permission classes; stored objects are never writable
const OBJECT_MODE: u32 = 0o444;

/// move `src` into the store at `dst`
///
/// establishes a hardlink so the original and the stored copy share an
/// inode, falling back to a byte copy across devices. both paths end up
/// read-only.
pub fn store(src: &Path, dst: &Path) -> Result<()> {
    debug!(src = %src.display(), dst = %dst.display(), "storing");

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    link_or_copy(src, dst)?;

    // same inode when hardlinked, distinct inodes after a copy fallback
    fs::set_permissions(src, Permissions::from_mode(OBJECT_MODE)).with_path(src)?;
    fs::set_permissions(dst, Permissions::from_mode(OBJECT_MODE)).with_path(dst)?;
    Ok(())
}

/// bring a stored file back out to `dst`
///
/// the hardlink restores the original inode relationship; the caller
/// re-applies the recorded permission bits afterwards.
pub fn fetch(src: &Path, dst: &Path) -> Result<()> {
    debug!(src = %src.display(), dst = %dst.display(), "fetching");

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    link_or_copy(src, dst)
}

/// bring a stored file back out as an independent copy
///
/// no inode is shared, so the caller can loosen the copy's permission
/// bits without touching the stored file.
pub fn fetch_copy(src: &Path, dst: &Path) -> Result<()> {
    debug!(src = %src.display(), dst = %dst.display(), "fetching copy");

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    fs::copy(src, dst).with_path(dst)?;
    Ok(())
}

/// append one record, terminated by a line break
pub fn append(path: &Path, line: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_path(path)?;
    file.write_all(line.as_bytes()).with_path(path)?;
    file.write_all(b"\n").with_path(path)?;
    Ok(())
}

/// read a file as its raw line sequence
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).with_path(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

fn link_or_copy(src: &Path, dst: &Path) -> Result<()> {
    match fs::hard_link(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(nix::libc::EXDEV) => {
            fs::copy(src, dst).with_path(dst)?;
            Ok(())
        }
        Err(e) => std::io::Result::Err(e).with_path(dst),
    }
}
