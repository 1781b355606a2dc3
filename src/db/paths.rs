// src/db/paths.rs
//! Path derivation for store-side directories

use std::path::{Path, PathBuf};

/// Directory containing the store
pub fn db_dir(db_path: &str) -> PathBuf {
    Path::new(db_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf()
}

/// Default directory for per-container lock files
pub fn lock_dir(db_path: &str) -> PathBuf {
    std::env::var("CARTRIDGE_LOCK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| db_dir(db_path).join("locks"))
}

/// Lock file guarding one container
pub fn container_lock_path(lock_dir: &Path, container_id: i64) -> PathBuf {
    lock_dir.join(format!("container-{}.lock", container_id))
}
