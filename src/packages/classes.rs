// src/packages/classes.rs

//! Class-definition discovery and transformation
//!
//! Class definitions live in `<package>/ezcontentclass/class-*.xml`. Scans
//! are sorted by file name so transforms run in a stable order.

use crate::error::{Error, Result};
use crate::packages::traits::ClassTransformer;
use crate::packages::xml::parse_document;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory holding class definitions inside a package
pub const CLASS_DIRECTORY: &str = "ezcontentclass";

/// File-name pattern of class definitions
pub const CLASS_FILE_PATTERN: &str = "class-*.xml";

/// List class-definition documents of an exploded package
///
/// An empty result is not an error; it is logged as a notice.
pub fn find_class_definitions(package_path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let package_path = package_path.as_ref();
    let pattern = format!(
        "{}/{}/{}",
        Pattern::escape(&package_path.to_string_lossy()),
        CLASS_DIRECTORY,
        CLASS_FILE_PATTERN
    );

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut found = Vec::new();
    let paths = glob::glob_with(&pattern, options)
        .map_err(|e| Error::PatternError(format!("{}: {}", pattern, e)))?;
    for entry in paths {
        let path = entry.map_err(|e| Error::IoError(e.to_string()))?;
        if path.is_file() {
            found.push(path);
        }
    }

    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if found.is_empty() {
        info!(
            "No class definitions found in {}",
            package_path.join(CLASS_DIRECTORY).display()
        );
    } else {
        debug!(
            "Found {} class definitions in {}",
            found.len(),
            package_path.display()
        );
    }

    Ok(found)
}

/// Hand each definition to the transformer, once, in order
///
/// A path that no longer exists means extraction and scanning disagree, so
/// it aborts with `ClassDefinitionMissing` instead of being skipped.
pub fn transform_all(paths: &[PathBuf], transformer: &dyn ClassTransformer) -> Result<usize> {
    for path in paths {
        if !path.exists() {
            return Err(Error::ClassDefinitionMissing(path.clone()));
        }
        debug!("Transforming {}", path.display());
        transformer.transform(path)?;
    }
    Ok(paths.len())
}

/// The parts of a class-definition document the installer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub identifier: String,
    pub name: String,
    pub remote_id: Option<String>,
    /// Modification timestamp; larger is newer
    pub modified: i64,
}

impl ClassDefinition {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
            .map_err(|reason| Error::ParseError(format!("{}: {}", path.display(), reason)))
    }

    pub fn parse_str(content: &str) -> std::result::Result<Self, String> {
        let root = parse_document(content)?;
        if root.name != "content-class" {
            return Err(format!("expected <content-class>, found <{}>", root.name));
        }

        let identifier = root
            .child_text("identifier")
            .ok_or_else(|| "missing <identifier>".to_string())?
            .to_string();
        let name = root
            .child_text("name")
            .map(str::to_string)
            .unwrap_or_else(|| identifier.clone());
        let modified = match root.child_text("modified") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| format!("invalid <modified> '{}': {}", raw, e))?,
            None => 0,
        };

        Ok(Self {
            identifier,
            name,
            remote_id: root.child_text("remote-id").map(str::to_string),
            modified,
        })
    }
}
