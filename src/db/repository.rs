// src/db/repository.rs

//! Local repository adapter
//!
//! `LocalRepository` plays the part of the content-management site: it keeps
//! package records, installs content classes from class-definition
//! documents and stores content objects. Binary packages are unpacked under
//! `package_root`, one directory per registration, so a new archive can be
//! staged while the previous registration of the same name is still intact.

use crate::db::models::{ClassRecord, ObjectRecord, PackageRecord, ViewCache};
use crate::error::{Error, LoadError, Result};
use crate::filesystem::path::sanitize_package_name;
use crate::install::InstallParameters;
use crate::packages::archive::ArchiveExtractor;
use crate::packages::classes::{ClassDefinition, find_class_definitions};
use crate::packages::manifest::{CONTENT_CLASS_ITEM, ManifestDocument};
use crate::packages::package::Package;
use crate::packages::resolve::MANIFEST_FILE;
use crate::packages::traits::{
    ContentClass, ContentClassStore, ContentObject, ContentObjectStore, PackageRegistry,
};
use chrono::Utc;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct LocalRepository {
    conn: Connection,
    package_root: PathBuf,
}

impl LocalRepository {
    /// Open the repository database at `db_path`
    pub fn open(db_path: impl AsRef<Path>, package_root: impl Into<PathBuf>) -> Result<Self> {
        let conn = crate::db::open(db_path)?;
        Ok(Self::with_connection(conn, package_root))
    }

    /// Wrap an already migrated connection
    pub fn with_connection(conn: Connection, package_root: impl Into<PathBuf>) -> Self {
        Self {
            conn,
            package_root: package_root.into(),
        }
    }

    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// All registered package records, by name
    pub fn packages(&self) -> Result<Vec<PackageRecord>> {
        PackageRecord::list_all(&self.conn)
    }

    pub fn classes_of_package(&self, package_name: &str) -> Result<Vec<ContentClass>> {
        Ok(ClassRecord::find_by_package(&self.conn, package_name)?
            .iter()
            .map(ClassRecord::to_content_class)
            .collect())
    }

    /// Create a content object of the class `class_identifier`
    pub fn create_object(&self, name: &str, class_identifier: &str) -> Result<ContentObject> {
        let class = ClassRecord::find_by_identifier(&self.conn, class_identifier)?.ok_or_else(
            || Error::InvalidReference(format!("no content class '{}'", class_identifier)),
        )?;
        let id = ObjectRecord::insert(&self.conn, name, class.id.unwrap_or_default())?;
        ObjectRecord::find_by_id(&self.conn, id)?
            .ok_or_else(|| Error::InvalidReference(format!("object {} vanished", id)))
    }

    /// Store a rendered view of an object
    pub fn cache_view(&self, object_id: i64, view: &str, body: &str) -> Result<()> {
        ViewCache::put(&self.conn, object_id, view, body)
    }

    pub fn cached_views(&self, object_id: i64) -> Result<i64> {
        ViewCache::count_for_object(&self.conn, object_id)
    }

    /// Directory this repository owns for `package`, if any
    ///
    /// Text packages loaded from a user's checkout live elsewhere and are
    /// never deleted.
    fn owned_directory(&self, package: &Package) -> Option<PathBuf> {
        let dir = package.repository_path();
        let root = self.package_root.canonicalize().ok()?;
        let dir = dir.canonicalize().ok()?;
        (dir != root && dir.starts_with(&root)).then_some(dir)
    }

    fn delete_directory(&self, dir: &Path) {
        match fs::remove_dir_all(dir) {
            Ok(()) => debug!("Deleted package directory {}", dir.display()),
            Err(e) => warn!("Could not delete {}: {}", dir.display(), e),
        }
    }

    fn remove_in(&self, conn: &Connection, package: &Package) -> Result<Option<PathBuf>> {
        if PackageRecord::delete_by_name(conn, package.name())? {
            info!("Removed package record '{}'", package.name());
        } else {
            debug!("No package record '{}' to remove", package.name());
        }
        Ok(self.owned_directory(package))
    }

    fn install_in(
        &self,
        conn: &Connection,
        package: &Package,
        params: &InstallParameters,
    ) -> Result<bool> {
        let package_dir = package.path();
        if !package_dir.is_dir() {
            warn!(
                "Package '{}' has no directory at {}",
                package.name(),
                package_dir.display()
            );
            return Ok(false);
        }

        let definitions = class_definition_paths(package)?;
        if definitions.is_empty() {
            warn!("Package '{}' contains no class definitions", package.name());
        }

        let mut installed = 0;
        let mut skipped = 0;
        for path in &definitions {
            let definition = ClassDefinition::parse_file(path)?;
            let existing = ClassRecord::find_by_identifier(conn, &definition.identifier)?;

            if package.check_for_installed_version
                && let Some(existing) = &existing
                && existing.modified >= definition.modified
            {
                debug!(
                    "Class '{}' is already installed at version {}, skipping",
                    definition.identifier, existing.modified
                );
                skipped += 1;
                continue;
            }

            let mut record = ClassRecord::from_definition(&definition, package.name());
            record.upsert(conn)?;
            debug!(
                "Installed class '{}' (version {})",
                definition.identifier, definition.modified
            );
            installed += 1;
        }

        let mut record = PackageRecord::from_package(package);
        record.installed = true;
        record.installed_at = Some(Utc::now().to_rfc3339());
        record.installed_by = Some(params.user_id);
        record.upsert(conn)?;

        info!(
            "Package '{}': {} classes installed, {} up to date",
            package.name(),
            installed,
            skipped
        );
        Ok(true)
    }

    fn uninstall_in(
        &self,
        conn: &Connection,
        package: &Package,
        params: &InstallParameters,
    ) -> Result<bool> {
        if !package.is_installed {
            warn!("Package '{}' is not marked installed", package.name());
            return Ok(false);
        }

        let classes = ClassRecord::find_by_package(conn, package.name())?;
        for class in &classes {
            let id = class.id.unwrap_or_default();
            let objects = ClassRecord::object_count(conn, id)?;
            if objects > 0 {
                warn!(
                    "Cannot uninstall '{}': class '{}' still has {} content objects",
                    package.name(),
                    class.identifier,
                    objects
                );
                return Ok(false);
            }
        }

        for class in &classes {
            ClassRecord::delete(conn, class.id.unwrap_or_default())?;
        }
        if !PackageRecord::mark_uninstalled(conn, package.name())?
            && self.owned_directory(package).is_some()
        {
            // Files under package_root stay tracked until remove-binary
            let mut record = PackageRecord::from_package(package);
            record.installed = false;
            record.upsert(conn)?;
            debug!("Re-registered '{}' as not installed", package.name());
        }

        info!(
            "Uninstalled {} classes of '{}' as user {}",
            classes.len(),
            package.name(),
            params.user_id
        );
        Ok(true)
    }
}

/// Class definitions a package installs
///
/// Content-class install items of the manifest win; packages without any
/// fall back to scanning `ezcontentclass/class-*.xml`.
fn class_definition_paths(package: &Package) -> Result<Vec<PathBuf>> {
    let package_dir = package.path();
    let listed: Vec<PathBuf> = package
        .parameters()
        .install_items
        .iter()
        .filter(|item| item.item_type == CONTENT_CLASS_ITEM)
        .filter_map(|item| item.document_path(&package_dir))
        .collect();

    if listed.is_empty() {
        return find_class_definitions(&package_dir);
    }

    if let Some(missing) = listed.iter().find(|p| !p.is_file()) {
        return Err(Error::ClassDefinitionMissing(missing.clone()));
    }
    Ok(listed)
}

impl PackageRegistry for LocalRepository {
    fn fetch(&self, name: &str) -> Result<Option<Package>> {
        Ok(PackageRecord::find_by_name(&self.conn, name)?.map(|r| r.to_package()))
    }

    fn fetch_archive(&self, file: &Path, name: &str) -> Result<Package> {
        let name = sanitize_package_name(name)?;
        let slot = self.package_root.join(format!(
            "{}-{}",
            name,
            Utc::now().format("%Y%m%d%H%M%S%f")
        ));
        let destination = slot.join(name);

        let loaded = ArchiveExtractor::new()
            .extract(file, &destination)
            .and_then(|_| {
                let manifest_path = destination.join(MANIFEST_FILE);
                if !manifest_path.is_file() {
                    return Err(LoadError::ManifestMissing(manifest_path).into());
                }
                let document = ManifestDocument::parse_file(&manifest_path)?;
                document
                    .parse_parameters()
                    .ok_or_else(|| LoadError::NoParameters(manifest_path).into())
            });

        match loaded {
            Ok(parameters) => {
                debug!("Staged archive {} at {}", file.display(), slot.display());
                Ok(Package::new(name, slot, parameters))
            }
            Err(e) => {
                if slot.exists() {
                    self.delete_directory(&slot);
                }
                Err(e)
            }
        }
    }

    fn unregister(&self, package: &Package) -> Result<()> {
        if PackageRecord::delete_by_name(&self.conn, package.name())? {
            info!(
                "Dropped package record '{}', files kept at {}",
                package.name(),
                package.repository_path().display()
            );
        }
        Ok(())
    }

    fn remove(&self, package: &Package) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let owned = self.remove_in(&tx, package)?;
        tx.commit()?;

        if let Some(dir) = owned {
            self.delete_directory(&dir);
        }
        Ok(())
    }

    fn install(&self, package: &Package, params: &InstallParameters) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let installed = self.install_in(&tx, package, params)?;
        tx.commit()?;
        Ok(installed)
    }

    fn uninstall(&self, package: &Package, params: &InstallParameters) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let uninstalled = self.uninstall_in(&tx, package, params)?;
        tx.commit()?;
        Ok(uninstalled)
    }

    /// Remove `previous` and install `package` in one transaction
    ///
    /// If installing fails the previous records stay registered and their
    /// directories are kept.
    fn replace(
        &self,
        previous: &[Package],
        package: &Package,
        params: &InstallParameters,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let mut owned = Vec::new();
        for old in previous {
            owned.extend(self.remove_in(&tx, old)?);
        }

        let installed = match self.install_in(&tx, package, params) {
            Ok(installed) => installed,
            Err(e) => {
                drop(tx);
                if let Some(dir) = self.owned_directory(package)
                    && !owned.contains(&dir)
                {
                    self.delete_directory(&dir);
                }
                return Err(e);
            }
        };

        if !installed {
            drop(tx);
            if let Some(dir) = self.owned_directory(package)
                && !owned.contains(&dir)
            {
                self.delete_directory(&dir);
            }
            return Ok(false);
        }
        tx.commit()?;

        let current = self.owned_directory(package);
        for dir in owned {
            if current.as_ref() != Some(&dir) {
                self.delete_directory(&dir);
            }
        }
        Ok(true)
    }
}

impl ContentObjectStore for LocalRepository {
    fn fetch_object(&self, id: i64) -> Result<Option<ContentObject>> {
        ObjectRecord::find_by_id(&self.conn, id)
    }

    fn store_object(&self, object: &ContentObject) -> Result<()> {
        if !ObjectRecord::update(&self.conn, object)? {
            return Err(Error::InvalidReference(format!(
                "no content object with id {}",
                object.id
            )));
        }
        Ok(())
    }

    fn invalidate_cache(&self, id: i64) -> Result<()> {
        let cleared = ViewCache::clear_object(&self.conn, id)?;
        debug!("Cleared {} cached views of object {}", cleared, id);
        Ok(())
    }
}

impl ContentClassStore for LocalRepository {
    fn fetch_class_by_identifier(&self, identifier: &str) -> Result<Option<ContentClass>> {
        Ok(ClassRecord::find_by_identifier(&self.conn, identifier)?
            .map(|record| record.to_content_class()))
    }
}
