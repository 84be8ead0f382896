// src/filesystem/path.rs

//! Path handling for untrusted archive entries and package names
//!
//! Binary packages come from outside the repository, so every entry path is
//! normalized before anything is written, and package names are checked
//! before they become directory or lock-file names.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Normalize an archive entry path into a relative path
///
/// - `.` components are dropped
/// - leading slashes are stripped
/// - any `..` component is rejected
/// - an empty result is rejected
///
/// ```
/// use ezpkg::filesystem::path::sanitize_path;
/// use std::path::PathBuf;
///
/// assert_eq!(sanitize_path("./ezcontentclass/class-article.xml").unwrap(),
///            PathBuf::from("ezcontentclass/class-article.xml"));
/// assert!(sanitize_path("../package.xml").is_err());
/// ```
pub fn sanitize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();
    let relative = path_str.trim_start_matches('/');

    let mut normalized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path_str.to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath(format!(
            "archive entry '{}' is empty after normalization",
            path_str
        )));
    }

    Ok(normalized)
}

/// Join a root with an untrusted relative path, refusing to escape the root
pub fn safe_join(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    let joined = root.join(sanitize_path(path.as_ref())?);

    if let (Ok(canonical_root), Ok(canonical_joined)) = (root.canonicalize(), joined.canonicalize())
        && !canonical_joined.starts_with(&canonical_root)
    {
        return Err(Error::PathTraversal(format!(
            "{} escapes {}",
            joined.display(),
            root.display()
        )));
    }

    Ok(joined)
}

/// Validate a package name before it is used as a single path component
pub fn sanitize_package_name(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(Error::InvalidPath("empty package name".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(Error::PathTraversal(format!(
            "package name is not a plain file name: {}",
            name
        )));
    }
    Ok(name)
}

/// Move a file into place, falling back to copy+sync+delete across filesystems
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            debug!(
                "Cross-filesystem move ({} -> {}), copying",
                src.display(),
                dst.display()
            );
            fs::copy(src, dst)?;
            File::open(dst)?.sync_all()?;
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}
