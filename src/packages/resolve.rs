// src/packages/resolve.rs

//! Package location heuristics
//!
//! A text package is addressed by `(repository path, package name)`, where the
//! package lives in `repository/name/package.xml`. Binary packages carry their
//! name in the file name only: `<name>[-<version>-<revision>].ezpkg`.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// File name of a package manifest
pub const MANIFEST_FILE: &str = "package.xml";

/// Extension of binary package archives
pub const ARCHIVE_EXTENSION: &str = "ezpkg";

/// Where a text package lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLocation {
    pub repository_path: PathBuf,
    pub name: String,
}

impl PackageLocation {
    /// Directory holding the package's manifest
    pub fn package_path(&self) -> PathBuf {
        self.repository_path.join(&self.name)
    }
}

/// Result of the archive file-name heuristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveName {
    Name(String),
    Unparseable,
}

impl ArchiveName {
    /// The resolved name, or the empty string when unparseable
    pub fn as_str(&self) -> &str {
        match self {
            ArchiveName::Name(name) => name,
            ArchiveName::Unparseable => "",
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            ArchiveName::Name(name) => Some(name),
            ArchiveName::Unparseable => None,
        }
    }
}

/// Resolve a directory into its repository path and package name
///
/// Fails with `NotAPackage` unless `path` is a directory containing
/// `package.xml`.
pub fn resolve_from_directory(path: impl AsRef<Path>) -> Result<PackageLocation> {
    let path = path.as_ref();
    if !path.is_dir() || !path.join(MANIFEST_FILE).is_file() {
        return Err(Error::NotAPackage(path.to_path_buf()));
    }

    let absolute = path
        .canonicalize()
        .map_err(|_| Error::NotAPackage(path.to_path_buf()))?;

    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::NotAPackage(absolute.clone()))?;
    let repository_path = absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::NotAPackage(absolute.clone()))?;

    Ok(PackageLocation {
        repository_path,
        name,
    })
}

/// Apply the file-name heuristic to an archive name
///
/// Split on `-`; with fewer than two segments split on `.` instead and drop
/// the extension. The first remaining segment is the name. Names that
/// legitimately contain `-` resolve to their first segment only.
pub fn parse_archive_name(file_name: &str) -> ArchiveName {
    let dashed: Vec<&str> = file_name.split('-').collect();
    let first = if dashed.len() >= 2 {
        dashed.first().copied()
    } else {
        let mut dotted: Vec<&str> = file_name.split('.').collect();
        dotted.pop();
        dotted.first().copied()
    };

    match first {
        Some(name) if !name.is_empty() => ArchiveName::Name(name.to_string()),
        _ => ArchiveName::Unparseable,
    }
}

/// Package name for an archive file name, empty when it cannot be derived
pub fn package_name_from_archive_filename(file_name: &str) -> String {
    parse_archive_name(file_name).as_str().to_string()
}

/// Directory an archive explodes into: its containing directory joined with
/// the package name
pub fn package_path_from_archive_filename(archive: impl AsRef<Path>) -> Result<PathBuf> {
    let archive = archive.as_ref();
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match parse_archive_name(&file_name) {
        ArchiveName::Name(name) => {
            let dir = archive.parent().unwrap_or_else(|| Path::new(""));
            Ok(dir.join(name))
        }
        ArchiveName::Unparseable => Err(Error::ArchiveError(format!(
            "cannot derive a package name from '{}'",
            archive.display()
        ))),
    }
}

/// Whether a path names a binary package archive
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == ARCHIVE_EXTENSION)
        .unwrap_or(false)
}
