// src/packages/loader.rs

//! Loading text packages from arbitrary repository directories
//!
//! The repository's own loader only knows its default package root. This
//! loader reads `repository/name/package.xml` from anywhere and binds the
//! resulting package to that repository path.

use crate::error::{Error, LoadError, Result};
use crate::packages::manifest::ManifestDocument;
use crate::packages::package::Package;
use crate::packages::resolve::MANIFEST_FILE;
use crate::packages::traits::PackageRegistry;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct PackageLoader<'a> {
    registry: &'a dyn PackageRegistry,
}

impl<'a> PackageLoader<'a> {
    pub fn new(registry: &'a dyn PackageRegistry) -> Self {
        Self { registry }
    }

    /// Load `repository_path/package_name` as an installable package
    ///
    /// Any registered package of the same name is removed first, so at most
    /// one record per name exists once the new package is installed. When
    /// that record points at the very directory being loaded only the record
    /// goes; the files are the package being loaded.
    pub fn load(&self, package_name: &str, repository_path: impl AsRef<Path>) -> Result<Package> {
        let repository_path = repository_path.as_ref();
        let package_dir = repository_path.join(package_name);

        let (repository_path, package_dir) =
            match (absolute(repository_path), absolute(&package_dir)) {
                (Some(repo), Some(dir)) if dir.is_dir() => (repo, dir),
                _ => return Err(LoadError::PackagePathMissing(package_dir).into()),
            };

        let manifest_path = package_dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(LoadError::ManifestMissing(manifest_path).into());
        }

        if let Some(existing) = self.registry.fetch(package_name)? {
            if absolute(existing.repository_path()).as_ref() == Some(&repository_path) {
                info!(
                    "Dropping package record '{}', loading its files in place",
                    existing.name()
                );
                self.registry.unregister(&existing)?;
            } else {
                info!("Removing existing package record '{}'", existing.name());
                self.registry.remove(&existing)?;
            }
        }

        let document = ManifestDocument::parse_file(&manifest_path).map_err(|e| match e {
            Error::ParseError(reason) => Error::Load(LoadError::ManifestUnparseable {
                path: manifest_path.clone(),
                reason,
            }),
            Error::Io(io) => Error::Load(LoadError::ManifestUnparseable {
                path: manifest_path.clone(),
                reason: io.to_string(),
            }),
            other => other,
        })?;

        let parameters = document
            .parse_parameters()
            .ok_or_else(|| LoadError::NoParameters(manifest_path.clone()))?;

        if parameters.name != package_name {
            warn!(
                "Manifest {} declares name '{}', loading it as '{}'",
                manifest_path.display(),
                parameters.name,
                package_name
            );
        }

        debug!(
            "Loaded package '{}' from {}",
            package_name,
            repository_path.display()
        );
        Ok(Package::new(package_name, repository_path, parameters))
    }
}

fn absolute(path: &Path) -> Option<PathBuf> {
    path.canonicalize().ok()
}
