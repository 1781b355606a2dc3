// src/db/lock.rs

//! Per-container exclusive lock
//!
//! An import run holds this lock while it creates, updates and renumbers a
//! container's content, so two runs against the same container never
//! interleave their position fixes. Runs against different containers use
//! different lock files and proceed in parallel.
//!
//! # Example
//!
//! ```ignore
//! use cartridge::db::lock::ContainerLock;
//!
//! let lock = ContainerLock::acquire("/srv/courses/locks", course_id)?;
//! // ... import ...
//! // Lock released on drop
//! ```

use super::paths::container_lock_path;
use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exclusive `flock` on `<lock_dir>/container-<id>.lock`
pub struct ContainerLock {
    /// Kept open to hold the lock
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl ContainerLock {
    fn open(lock_dir: &Path, container_id: i64) -> Result<(File, PathBuf)> {
        fs::create_dir_all(lock_dir)?;
        let path = container_lock_path(lock_dir, container_id);
        let file = File::create(&path)?;
        Ok((file, path))
    }

    /// Acquire the lock, blocking until it is available
    pub fn acquire<P: AsRef<Path>>(lock_dir: P, container_id: i64) -> Result<Self> {
        let (file, path) = Self::open(lock_dir.as_ref(), container_id)?;

        file.lock_exclusive().map_err(|e| {
            Error::LockError(format!("Failed to lock container {}: {}", container_id, e))
        })?;

        info!("Acquired container lock at {:?}", path);
        Ok(Self { file, path })
    }

    /// Try to acquire the lock without blocking
    ///
    /// Returns `Ok(None)` when another run holds it.
    pub fn try_acquire<P: AsRef<Path>>(lock_dir: P, container_id: i64) -> Result<Option<Self>> {
        let (file, path) = Self::open(lock_dir.as_ref(), container_id)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                info!("Acquired container lock at {:?}", path);
                Ok(Some(Self { file, path }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                debug!("Container lock already held at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(Error::LockError(format!(
                "Failed to try-lock container {}: {}",
                container_id, e
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ContainerLock {
    fn drop(&mut self) {
        // Closing the file releases the lock
        debug!("Released container lock at {:?}", self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_excludes_same_container() {
        let dir = TempDir::new().unwrap();

        let lock = ContainerLock::acquire(dir.path(), 7).unwrap();
        assert!(lock.path().ends_with("container-7.lock"));
        assert!(ContainerLock::try_acquire(dir.path(), 7).unwrap().is_none());

        drop(lock);
        assert!(ContainerLock::try_acquire(dir.path(), 7).unwrap().is_some());
    }

    #[test]
    fn test_different_containers_do_not_conflict() {
        let dir = TempDir::new().unwrap();

        let _a = ContainerLock::acquire(dir.path(), 1).unwrap();
        let b = ContainerLock::try_acquire(dir.path(), 2).unwrap();
        assert!(b.is_some());
    }
}
