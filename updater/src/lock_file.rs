//! Single-instance enforcement via a PID lock file.
//!
//! Out of scope as a daemonization/process-manager concern per the system
//! design, but the core still calls it: acquire before starting, release on
//! clean shutdown (`Drop`).

use std::fs;
use std::io::Write;

use crate::error::StartupError;

pub struct LockFile {
    path: String,
}

impl LockFile {
    /// Acquires the lock at `path`, or returns `StartupError::LockHeld` if a
    /// live process already holds it. A lock file pointing at a dead pid is
    /// stale and silently reclaimed.
    pub fn acquire(path: &str) -> Result<Self, StartupError> {
        if let Ok(existing) = fs::read_to_string(path) {
            if let Ok(pid) = existing.trim().parse::<i32>() {
                if pid_alive(pid) {
                    return Err(StartupError::LockHeld(pid));
                }
            }
        }

        let mut file = fs::File::create(path)?;
        write!(file, "{}", std::process::id())?;
        Ok(Self { path: path.to_string() })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn pid_alive(pid: i32) -> bool {
    // signal 0 performs no-op existence/permission checks only.
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
fn pid_alive(_pid: i32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_and_releases() {
        let path = std::env::temp_dir().join("oracle-updater-test.lock");
        let path = path.to_str().unwrap().to_string();
        let _ = fs::remove_file(&path);

        {
            let _lock = LockFile::acquire(&path).unwrap();
            assert!(fs::metadata(&path).is_ok());
        }
        assert!(fs::metadata(&path).is_err());
    }

    #[test]
    fn reclaims_stale_lock() {
        let path = std::env::temp_dir().join("oracle-updater-stale.lock");
        let path = path.to_str().unwrap().to_string();
        fs::write(&path, "999999999").unwrap();

        let lock = LockFile::acquire(&path);
        assert!(lock.is_ok());
        drop(lock);
        let _ = fs::remove_file(&path);
    }
}
