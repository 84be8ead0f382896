// src/packages/traits.rs

//! Interfaces to the systems ezpkg drives
//!
//! The content repository (package registry, class and object storage) and
//! the class-definition transformer are external. ezpkg talks to them only
//! through these traits; `db::LocalRepository` is the bundled adapter.

use crate::error::Result;
use crate::install::InstallParameters;
use crate::packages::package::Package;
use std::path::Path;

/// The repository's package registry and installation API
pub trait PackageRegistry {
    /// Look up a registered package record by name
    fn fetch(&self, name: &str) -> Result<Option<Package>>;

    /// Build a package reference from a binary archive, registered as `name`
    fn fetch_archive(&self, file: &Path, name: &str) -> Result<Package>;

    /// Drop a package record along with any files the registry owns for it
    fn remove(&self, package: &Package) -> Result<()>;

    /// Drop a package record, leaving its files in place
    fn unregister(&self, package: &Package) -> Result<()>;

    /// Install a package, honoring `package.check_for_installed_version`
    fn install(&self, package: &Package, params: &InstallParameters) -> Result<bool>;

    /// Uninstall a package; requires `package.is_installed`
    fn uninstall(&self, package: &Package, params: &InstallParameters) -> Result<bool>;

    /// Remove every package in `previous` and install `package`
    ///
    /// The default runs the steps back to back. Registries that can
    /// should override this with a single transaction.
    fn replace(
        &self,
        previous: &[Package],
        package: &Package,
        params: &InstallParameters,
    ) -> Result<bool> {
        for old in previous {
            self.remove(old)?;
        }
        self.install(package, params)
    }
}

/// A content class known to the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentClass {
    pub id: i64,
    pub identifier: String,
    pub name: String,
    /// Modification timestamp, used as the class version
    pub modified: i64,
}

/// A content object instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentObject {
    pub id: i64,
    pub name: String,
    pub class_id: i64,
    pub class_identifier: String,
}

impl ContentObject {
    /// Point this object at another class
    pub fn set_class(&mut self, class: &ContentClass) {
        self.class_id = class.id;
        self.class_identifier = class.identifier.clone();
    }
}

/// Content object storage and its rendering cache
pub trait ContentObjectStore {
    fn fetch_object(&self, id: i64) -> Result<Option<ContentObject>>;

    fn store_object(&self, object: &ContentObject) -> Result<()>;

    /// Drop cached renderings of an object
    fn invalidate_cache(&self, id: i64) -> Result<()>;
}

/// Content class lookup
pub trait ContentClassStore {
    fn fetch_class_by_identifier(&self, identifier: &str) -> Result<Option<ContentClass>>;
}

/// Rewrites a single class-definition document in place
pub trait ClassTransformer {
    fn transform(&self, definition: &Path) -> Result<()>;
}
