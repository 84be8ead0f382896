// src/packages/manifest.rs

//! Package manifest (`package.xml`) parsing
//!
//! A manifest looks like:
//!
//! ```text
//! <package version="3.5.2">
//!   <name>blog</name>
//!   <summary>Blog classes</summary>
//!   <type value="contentclass"/>
//!   <version-number>1.0</version-number>
//!   <release-number>2</release-number>
//!   <languages><language>eng-GB</language></languages>
//!   <install>
//!     <item type="ezcontentclass" filename="class-article" sub-directory="ezcontentclass"/>
//!   </install>
//! </package>
//! ```

use crate::error::{Error, Result};
use crate::packages::xml::{XmlElement, parse_document};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Install item type for content classes
pub const CONTENT_CLASS_ITEM: &str = "ezcontentclass";

/// One `<item>` of an install or uninstall list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallItem {
    pub item_type: String,
    pub name: Option<String>,
    pub filename: Option<String>,
    pub sub_directory: Option<String>,
}

impl InstallItem {
    fn from_element(element: &XmlElement) -> Option<Self> {
        let item_type = element.attribute("type")?.to_string();
        Some(Self {
            item_type,
            name: element.attribute("name").map(str::to_string),
            filename: element.attribute("filename").map(str::to_string),
            sub_directory: element.attribute("sub-directory").map(str::to_string),
        })
    }

    /// Path of the item's document inside a package directory
    pub fn document_path(&self, package_path: &Path) -> Option<PathBuf> {
        let filename = self.filename.as_deref()?;
        let dir = match self.sub_directory.as_deref() {
            Some(sub) => package_path.join(sub),
            None => package_path.join(&self.item_type),
        };
        Some(dir.join(format!("{}.xml", filename)))
    }
}

/// Parameters extracted from a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageParameters {
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub package_type: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub languages: Vec<String>,
    pub install_items: Vec<InstallItem>,
    pub uninstall_items: Vec<InstallItem>,
}

/// A parsed manifest document
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    path: PathBuf,
    root: XmlElement,
}

impl ManifestDocument {
    /// Parse a manifest file; empty or malformed files are `ParseError`s
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(Error::ParseError(format!(
                "{} is empty",
                path.display()
            )));
        }
        Self::parse_str(path, &content)
    }

    pub fn parse_str(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let root = parse_document(content)
            .map_err(|reason| Error::ParseError(format!("{}: {}", path.display(), reason)))?;
        Ok(Self { path, root })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Extract package parameters; `None` unless the root is `<package>`
    /// with a non-empty `<name>`
    pub fn parse_parameters(&self) -> Option<PackageParameters> {
        if self.root.name != "package" {
            return None;
        }
        let name = self.root.child_text("name")?.to_string();
        let text = |tag: &str| self.root.child_text(tag).map(str::to_string);

        let languages = self
            .root
            .child("languages")
            .map(|langs| {
                langs
                    .children_named("language")
                    .map(|l| l.text.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let items = |tag: &str| -> Vec<InstallItem> {
            self.root
                .child(tag)
                .map(|list| {
                    list.children_named("item")
                        .filter_map(InstallItem::from_element)
                        .collect()
                })
                .unwrap_or_default()
        };

        Some(PackageParameters {
            name,
            summary: text("summary"),
            description: text("description"),
            vendor: text("vendor"),
            package_type: self
                .root
                .child("type")
                .and_then(|t| t.attribute("value"))
                .map(str::to_string),
            version: text("version-number"),
            release: text("release-number"),
            languages,
            install_items: items("install"),
            uninstall_items: items("uninstall"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.5.2" development="false">
  <name>blog</name>
  <summary>Blog content classes</summary>
  <vendor>Example</vendor>
  <type value="contentclass"/>
  <version-number>1.2</version-number>
  <release-number>3</release-number>
  <languages>
    <language>eng-GB</language>
    <language>ger-DE</language>
  </languages>
  <install>
    <item type="ezcontentclass" name="Article" filename="class-article" sub-directory="ezcontentclass"/>
    <item type="ezcontentclass" name="Blog" filename="class-blog"/>
  </install>
  <uninstall>
    <item type="ezcontentclass" filename="class-article"/>
  </uninstall>
</package>"#;

    #[test]
    fn test_parse_parameters() {
        let doc = ManifestDocument::parse_str("package.xml", MANIFEST).unwrap();
        let params = doc.parse_parameters().unwrap();

        assert_eq!(params.name, "blog");
        assert_eq!(params.summary.as_deref(), Some("Blog content classes"));
        assert_eq!(params.package_type.as_deref(), Some("contentclass"));
        assert_eq!(params.version.as_deref(), Some("1.2"));
        assert_eq!(params.release.as_deref(), Some("3"));
        assert_eq!(params.languages, vec!["eng-GB", "ger-DE"]);
        assert_eq!(params.install_items.len(), 2);
        assert_eq!(params.uninstall_items.len(), 1);
        assert_eq!(params.install_items[0].name.as_deref(), Some("Article"));
    }

    #[test]
    fn test_item_document_path() {
        let doc = ManifestDocument::parse_str("package.xml", MANIFEST).unwrap();
        let params = doc.parse_parameters().unwrap();
        let pkg = Path::new("/repo/blog");

        assert_eq!(
            params.install_items[0].document_path(pkg),
            Some(PathBuf::from("/repo/blog/ezcontentclass/class-article.xml"))
        );
        assert_eq!(
            params.install_items[1].document_path(pkg),
            Some(PathBuf::from("/repo/blog/ezcontentclass/class-blog.xml"))
        );
    }

    #[test]
    fn test_no_parameters() {
        let doc = ManifestDocument::parse_str("package.xml", "<package><summary>x</summary></package>")
            .unwrap();
        assert!(doc.parse_parameters().is_none());

        let doc = ManifestDocument::parse_str("package.xml", "<other><name>x</name></other>").unwrap();
        assert!(doc.parse_parameters().is_none());

        let doc = ManifestDocument::parse_str("package.xml", "<package><name> </name></package>")
            .unwrap();
        assert!(doc.parse_parameters().is_none());
    }

    #[test]
    fn test_parse_file_rejects_empty_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.xml");
        fs::write(&empty, "").unwrap();
        assert!(matches!(
            ManifestDocument::parse_file(&empty),
            Err(Error::ParseError(_))
        ));

        let broken = dir.path().join("broken.xml");
        fs::write(&broken, "<package><name>blog</package>").unwrap();
        assert!(matches!(
            ManifestDocument::parse_file(&broken),
            Err(Error::ParseError(_))
        ));
    }
}
