// src/packages/package.rs

//! Installable package handle

use crate::packages::manifest::PackageParameters;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A text package bound to the repository directory it was loaded from
///
/// Installation reads class definitions from `repository_path/name`, so a
/// package can be installed from any checkout, not only from the
/// repository's default package root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    repository_path: PathBuf,
    parameters: PackageParameters,
    /// Skip content classes whose installed version is not older
    pub check_for_installed_version: bool,
    /// The repository considers this package installed
    pub is_installed: bool,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        repository_path: impl Into<PathBuf>,
        parameters: PackageParameters,
    ) -> Self {
        Self {
            name: name.into(),
            repository_path: repository_path.into(),
            parameters,
            check_for_installed_version: true,
            is_installed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repository_path(&self) -> &Path {
        &self.repository_path
    }

    /// Directory holding `package.xml`
    pub fn path(&self) -> PathBuf {
        self.repository_path.join(&self.name)
    }

    pub fn parameters(&self) -> &PackageParameters {
        &self.parameters
    }

    /// Version string as `version-release`, when declared
    pub fn version_label(&self) -> Option<String> {
        match (&self.parameters.version, &self.parameters.release) {
            (Some(v), Some(r)) => Some(format!("{}-{}", v, r)),
            (Some(v), None) => Some(v.clone()),
            _ => None,
        }
    }

    /// Each declared language mapped onto itself
    pub fn default_language_map(&self) -> BTreeMap<String, String> {
        self.parameters
            .languages
            .iter()
            .map(|l| (l.clone(), l.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language_map() {
        let params = PackageParameters {
            name: "blog".to_string(),
            languages: vec!["eng-GB".to_string(), "nor-NO".to_string()],
            ..Default::default()
        };
        let package = Package::new("blog", "/repo", params);

        let map = package.default_language_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("nor-NO").map(String::as_str), Some("nor-NO"));
        assert_eq!(package.path(), PathBuf::from("/repo/blog"));
        assert!(package.check_for_installed_version);
        assert!(!package.is_installed);
    }

    #[test]
    fn test_version_label() {
        let mut params = PackageParameters {
            name: "blog".to_string(),
            version: Some("1.0".to_string()),
            release: Some("2".to_string()),
            ..Default::default()
        };
        assert_eq!(
            Package::new("blog", "/r", params.clone()).version_label().as_deref(),
            Some("1.0-2")
        );
        params.version = None;
        assert_eq!(Package::new("blog", "/r", params).version_label(), None);
    }
}
