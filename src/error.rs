// src/error.rs

//! Error types for ezpkg
//!
//! Structural failures (bad paths, broken archives, unloadable manifests,
//! dangling object/class references) are raised as `Error`. Install and
//! uninstall outcomes are reported as booleans by the installer instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by ezpkg operations
#[derive(Error, Debug)]
pub enum Error {
    /// Path or pattern does not denote a text package
    #[error("not a package: {} (expected a directory containing package.xml)", .0.display())]
    NotAPackage(PathBuf),

    /// Binary package extraction failed
    #[error("archive error: {0}")]
    ArchiveError(String),

    /// Text package could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Object id or class identifier does not resolve
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// File pattern matched nothing or could not be evaluated
    #[error("pattern error: {0}")]
    PatternError(String),

    /// A scanned class definition vanished before it was transformed
    #[error("class definition disappeared before transform: {}", .0.display())]
    ClassDefinitionMissing(PathBuf),

    /// The class-definition transformer failed
    #[error("transform failed: {0}")]
    TransformError(String),

    /// XML document could not be interpreted
    #[error("parse error: {0}")]
    ParseError(String),

    /// Configuration file problem
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Package-name lock could not be taken
    #[error("lock error: {0}")]
    LockError(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("path traversal attempt: {0}")]
    PathTraversal(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Reasons a text package fails to load
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("package directory does not exist: {}", .0.display())]
    PackagePathMissing(PathBuf),

    #[error("package manifest not found: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("package manifest {} could not be parsed: {reason}", .path.display())]
    ManifestUnparseable { path: PathBuf, reason: String },

    #[error("package manifest {} yields no usable parameters", .0.display())]
    NoParameters(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_converts_into_error() {
        let err: Error = LoadError::ManifestMissing(PathBuf::from("/repo/pkg/package.xml")).into();
        assert!(matches!(err, Error::Load(LoadError::ManifestMissing(_))));
        assert!(err.to_string().contains("/repo/pkg/package.xml"));
    }

    #[test]
    fn test_not_a_package_display() {
        let err = Error::NotAPackage(PathBuf::from("/tmp/nothing"));
        let msg = err.to_string();
        assert!(msg.contains("/tmp/nothing"));
        assert!(msg.contains("package.xml"));
    }
}
