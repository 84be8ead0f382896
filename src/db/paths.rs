// src/db/paths.rs
//! Directories derived from the database location

use std::path::{Path, PathBuf};

/// Default location of the repository database
pub const DEFAULT_DB_PATH: &str = "/var/lib/ezpkg/ezpkg.db";

/// Get the directory containing the database
pub fn db_dir(db_path: &Path) -> PathBuf {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => PathBuf::from("/var/lib/ezpkg"),
    }
}

/// Where registered binary packages are unpacked
pub fn package_root(db_path: &Path) -> PathBuf {
    db_dir(db_path).join("packages")
}

/// Per-package-name lock files
pub fn lock_dir(db_path: &Path) -> PathBuf {
    db_dir(db_path).join("locks")
}

/// Diagnostic log file
pub fn log_path(db_path: &Path) -> PathBuf {
    db_dir(db_path).join("ezpkg.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_dir() {
        assert_eq!(
            db_dir(Path::new("/var/lib/ezpkg/ezpkg.db")),
            PathBuf::from("/var/lib/ezpkg")
        );
        assert_eq!(db_dir(Path::new("ezpkg.db")), PathBuf::from("."));
    }

    #[test]
    fn test_derived_dirs() {
        let db = Path::new("/srv/site/ezpkg.db");
        assert_eq!(package_root(db), PathBuf::from("/srv/site/packages"));
        assert_eq!(lock_dir(db), PathBuf::from("/srv/site/locks"));
        assert_eq!(log_path(db), PathBuf::from("/srv/site/ezpkg.log"));
    }
}
