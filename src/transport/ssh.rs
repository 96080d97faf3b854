//! remote transport over ssh and scp
//!
//! every invocation is a parameterized `Command`; remote paths are
//! single-quote escaped and record content travels over stdin, so no
//! entry or path ever gets spliced into a shell string unquoted.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::local;

/// copy a local file to the remote store path
///
/// ensures the remote parent directory exists, transfers the bytes,
/// then locks the remote copy read-only. the local source is left
/// untouched; hardlinking across hosts is not possible.
pub fn store(src: &Path, host: &str, path: &Path) -> Result<()> {
    debug!(src = %src.display(), host, path = %path.display(), "storing to remote");

    if let Some(parent) = path.parent() {
        run_ssh(host, &format!("mkdir -p {}", quote(parent)))?;
    }
    scp_to(src, host, path)?;
    run_ssh(host, &format!("chmod a-w {}", quote(path)))
}

/// copy a remote store path to a local file
pub fn fetch(host: &str, path: &Path, dst: &Path) -> Result<()> {
    debug!(host, path = %path.display(), dst = %dst.display(), "fetching from remote");

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    scp_from(host, path, dst)
}

/// append one record to a remote file
///
/// the line is written to the remote `cat` over stdin; only the quoted
/// destination path appears in the remote command itself.
pub fn append(host: &str, path: &Path, line: &str) -> Result<()> {
    let mut child = Command::new("ssh")
        .arg(host)
        .arg(format!("cat >> {}", quote(path)))
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Transport {
            message: format!("failed to spawn ssh: {}", e),
        })?;

    {
        let stdin = child.stdin.as_mut().ok_or_else(|| Error::Transport {
            message: "stdin not available".to_string(),
        })?;
        stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .map_err(|e| Error::Transport {
                message: format!("failed to write to remote append: {}", e),
            })?;
    }

    let status = child.wait().map_err(|e| Error::Transport {
        message: format!("failed to wait for ssh: {}", e),
    })?;

    if !status.success() {
        return Err(Error::Transport {
            message: format!("remote append to {}:{} failed", host, path.display()),
        });
    }
    Ok(())
}

/// stage a remote file locally, then read its lines
pub fn read_lines(host: &str, path: &Path, staging: &Path) -> Result<Vec<String>> {
    scp_from(host, path, staging)?;
    local::read_lines(staging)
}

/// check whether a remote path exists
pub fn exists(host: &str, path: &Path) -> Result<bool> {
    let status = Command::new("ssh")
        .arg(host)
        .arg(format!("test -e {}", quote(path)))
        .status()
        .map_err(|e| Error::Transport {
            message: format!("failed to spawn ssh: {}", e),
        })?;
    Ok(status.success())
}

fn run_ssh(host: &str, script: &str) -> Result<()> {
    let status = Command::new("ssh")
        .arg(host)
        .arg(script)
        .status()
        .map_err(|e| Error::Transport {
            message: format!("failed to spawn ssh: {}", e),
        })?;

    if !status.success() {
        return Err(Error::Transport {
            message: format!("remote command failed on {}: {}", host, script),
        });
    }
    Ok(())
}

fn scp_to(src: &Path, host: &str, path: &Path) -> Result<()> {
    scp(src.as_os_str().to_os_string(), remote_arg(host, path))
}

fn scp_from(host: &str, path: &Path, dst: &Path) -> Result<()> {
    scp(remote_arg(host, path), dst.as_os_str().to_os_string())
}

fn scp(from: std::ffi::OsString, to: std::ffi::OsString) -> Result<()> {
    let status = Command::new("scp")
        .arg("-q")
        .arg(&from)
        .arg(&to)
        .status()
        .map_err(|e| Error::Transport {
            message: format!("failed to spawn scp: {}", e),
        })?;

    if !status.success() {
        return Err(Error::Transport {
            message: format!(
                "scp {} -> {} failed",
                from.to_string_lossy(),
                to.to_string_lossy()
            ),
        });
    }
    Ok(())
}

fn remote_arg(host: &str, path: &Path) -> std::ffi::OsString {
    format!("{}:{}", host, path.display()).into()
}

/// single-quote a path for the remote shell
fn quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote(Path::new("/srv/pit/objects")), "'/srv/pit/objects'");
    }

    #[test]
    fn test_quote_embedded_quote() {
        assert_eq!(quote(Path::new("/srv/o'brien")), r"'/srv/o'\''brien'");
    }

    #[test]
    fn test_quote_spaces() {
        assert_eq!(quote(Path::new("/srv/my files")), "'/srv/my files'");
    }
}

// note: transfer tests require a remote server, so they're integration tests
