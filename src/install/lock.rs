// src/install/lock.rs

//! Per-package-name exclusive locks
//!
//! Two runs installing the same package name would otherwise both see "no
//! existing record" and register it twice. Each install, uninstall or
//! replace holds `<lock dir>/<name>.lock` with `flock(LOCK_EX)` while it
//! talks to the registry. The lock is released on drop.

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_package_name;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct PackageLock {
    file: File,
    path: PathBuf,
}

impl PackageLock {
    /// Block until the lock for `name` is held
    pub fn acquire(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let (file, path) = Self::open(dir.as_ref(), name)?;
        file.lock_exclusive().map_err(|e| {
            Error::LockError(format!("cannot lock {}: {}", path.display(), e))
        })?;
        debug!("Acquired package lock {}", path.display());
        Ok(Self { file, path })
    }

    /// Lock several names at once
    ///
    /// Names are taken in sorted order, so two callers locking the same pair
    /// in opposite order cannot deadlock. Duplicates are locked once.
    pub fn acquire_all(dir: impl AsRef<Path>, names: &[&str]) -> Result<Vec<Self>> {
        let mut names = names.to_vec();
        names.sort_unstable();
        names.dedup();
        names
            .into_iter()
            .map(|name| Self::acquire(dir.as_ref(), name))
            .collect()
    }

    /// Take the lock for `name` if nobody else holds it
    pub fn try_acquire(dir: impl AsRef<Path>, name: &str) -> Result<Option<Self>> {
        let (file, path) = Self::open(dir.as_ref(), name)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::LockError(format!(
                "cannot lock {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn open(dir: &Path, name: &str) -> Result<(File, PathBuf)> {
        let name = sanitize_package_name(name)?;
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.lock", name));
        let file = File::create(&path)?;
        Ok((file, path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PackageLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive_per_name() {
        let dir = TempDir::new().unwrap();
        let held = PackageLock::acquire(dir.path(), "blog").unwrap();
        assert!(held.path().ends_with("blog.lock"));

        assert!(PackageLock::try_acquire(dir.path(), "blog").unwrap().is_none());
        assert!(PackageLock::try_acquire(dir.path(), "forum").unwrap().is_some());

        drop(held);
        assert!(PackageLock::try_acquire(dir.path(), "blog").unwrap().is_some());
    }

    #[test]
    fn test_lock_rejects_path_names() {
        let dir = TempDir::new().unwrap();
        assert!(PackageLock::acquire(dir.path(), "../blog").is_err());
    }

    #[test]
    fn test_acquire_all_locks_in_name_order() {
        let dir = TempDir::new().unwrap();
        let held = PackageLock::acquire_all(dir.path(), &["journal", "blog", "journal"]).unwrap();
        assert_eq!(held.len(), 2);
        assert!(held[0].path().ends_with("blog.lock"));
        assert!(held[1].path().ends_with("journal.lock"));
        assert!(PackageLock::try_acquire(dir.path(), "blog").unwrap().is_none());
    }

    #[test]
    fn test_opposite_order_callers_both_finish() {
        let dir = TempDir::new().unwrap();
        let spawn = |names: [&'static str; 2]| {
            let dir = dir.path().to_path_buf();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    PackageLock::acquire_all(&dir, &names).unwrap();
                }
            })
        };

        let forward = spawn(["alpha", "beta"]);
        let backward = spawn(["beta", "alpha"]);
        forward.join().unwrap();
        backward.join().unwrap();
    }
}
