// src/migrate.rs

//! The migration facade
//!
//! `Migrator` is what callers drive: it extracts binary packages into text
//! packages and runs the class transformer over them, loads text packages
//! from any checkout, installs and uninstalls them, manages binary package
//! registrations and moves content objects between classes.
//!
//! ```ignore
//! let repo = LocalRepository::open(&db_path, package_root)?;
//! let mut migrator = Migrator::new(&repo).with_principal(Principal::new(14));
//! migrator.extract_and_transform("packages/*.ezpkg", &LogProgress::new("extract", 0))?;
//! if migrator.load_package_from_directory("packages/blog") {
//!     migrator.install(true);
//! }
//! ```

use crate::content::ClassReassigner;
use crate::error::{Error, Result};
use crate::install::{InstallOptions, Installer, Principal};
use crate::packages::archive::{ArchiveExtractor, archive_source_path};
use crate::packages::classes::{find_class_definitions, transform_all};
use crate::packages::loader::PackageLoader;
use crate::packages::package::Package;
use crate::packages::resolve::{is_archive, resolve_from_directory};
use crate::packages::traits::{
    ClassTransformer, ContentClassStore, ContentObjectStore, PackageRegistry,
};
use crate::progress::ProgressTracker;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Outcome of `Migrator::extract_and_transform`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Text packages produced, one per archive
    pub packages: Vec<PathBuf>,
    /// Matches that were not `.ezpkg` archives
    pub skipped: usize,
    /// Class definitions found across all packages
    pub definitions: usize,
    /// Class definitions handed to the transformer
    pub transformed: usize,
}

pub struct Migrator<'a> {
    registry: &'a dyn PackageRegistry,
    objects: &'a dyn ContentObjectStore,
    classes: &'a dyn ContentClassStore,
    transformer: Option<&'a dyn ClassTransformer>,
    options: InstallOptions,
    principal: Principal,
    lock_dir: Option<PathBuf>,
    package: Option<Package>,
}

impl<'a> Migrator<'a> {
    /// Drive a repository that provides all collaborator roles
    pub fn new<R>(repository: &'a R) -> Self
    where
        R: PackageRegistry + ContentObjectStore + ContentClassStore + 'a,
    {
        Self::from_parts(repository, repository, repository)
    }

    pub fn from_parts(
        registry: &'a dyn PackageRegistry,
        objects: &'a dyn ContentObjectStore,
        classes: &'a dyn ContentClassStore,
    ) -> Self {
        Self {
            registry,
            objects,
            classes,
            transformer: None,
            options: InstallOptions::default(),
            principal: Principal::new(crate::config::DEFAULT_USER_ID),
            lock_dir: None,
            package: None,
        }
    }

    pub fn with_transformer(mut self, transformer: &'a dyn ClassTransformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn with_options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    /// The currently loaded text package
    pub fn package(&self) -> Option<&Package> {
        self.package.as_ref()
    }

    fn installer(&self) -> Installer<'a> {
        let installer = Installer::new(self.registry, self.options.clone(), self.principal);
        match &self.lock_dir {
            Some(dir) => installer.with_lock_dir(dir),
            None => installer,
        }
    }

    /// Load `repository_path/name` as the current package
    pub fn load_package(&mut self, repository_path: impl AsRef<Path>, name: &str) -> Result<()> {
        let package = PackageLoader::new(self.registry).load(name, repository_path)?;
        info!(
            "Loaded package '{}' from {}",
            package.name(),
            package.repository_path().display()
        );
        self.package = Some(package);
        Ok(())
    }

    /// Load the text package in directory `path`
    ///
    /// Failures are logged and reported as `false`; the previously loaded
    /// package, if any, is dropped.
    pub fn load_package_from_directory(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.package = None;

        let location = match resolve_from_directory(path) {
            Ok(location) => location,
            Err(e) => {
                error!("{}", e);
                return false;
            }
        };

        match self.load_package(&location.repository_path, &location.name) {
            Ok(()) => true,
            Err(e) => {
                error!("Cannot load package from {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Extract every `.ezpkg` archive matching `pattern` next to itself and
    /// transform its class definitions
    ///
    /// Matches that are not archives are skipped. Extraction failures abort
    /// the whole run; packages without class definitions only log a notice.
    pub fn extract_and_transform(
        &self,
        pattern: &str,
        progress: &dyn ProgressTracker,
    ) -> Result<ExtractReport> {
        let pattern = archive_source_path(Path::new(pattern))
            .to_string_lossy()
            .into_owned();
        let matches = glob::glob(&pattern)
            .map_err(|e| Error::PatternError(format!("{}: {}", pattern, e)))?;

        let mut files = Vec::new();
        for entry in matches {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => warn!("Cannot read match of {}: {}", pattern, e),
            }
        }
        if files.is_empty() {
            return Err(Error::PatternError(format!("no files match '{}'", pattern)));
        }

        progress.set_length(files.len() as u64);
        let extractor = ArchiveExtractor::new();
        let mut report = ExtractReport::default();

        for file in &files {
            if !is_archive(file) || !file.is_file() {
                debug!("Skipping {}, not a binary package", file.display());
                report.skipped += 1;
                progress.increment(1);
                continue;
            }

            progress.set_message(&file.display().to_string());
            let extracted = match extractor.extract_package(file) {
                Ok(extracted) => extracted,
                Err(e) => {
                    progress.finish_with_error(&e.to_string());
                    return Err(e);
                }
            };

            let definitions = find_class_definitions(&extracted.destination)?;
            report.definitions += definitions.len();
            match self.transformer {
                Some(transformer) => {
                    report.transformed += transform_all(&definitions, transformer)?;
                }
                None if !definitions.is_empty() => {
                    info!(
                        "No transformer configured, {} definitions in {} left as extracted",
                        definitions.len(),
                        extracted.destination.display()
                    );
                }
                None => {}
            }

            report.packages.push(extracted.destination);
            progress.increment(1);
        }

        progress.finish_with_message(&format!(
            "{} packages extracted, {} class definitions transformed",
            report.packages.len(),
            report.transformed
        ));
        Ok(report)
    }

    /// Install the loaded package
    pub fn install(&mut self, check_version: bool) -> bool {
        self.installer().install(self.package.as_mut(), check_version)
    }

    /// Uninstall the loaded package
    pub fn uninstall(&mut self) -> bool {
        self.installer().uninstall(self.package.as_mut())
    }

    pub fn install_binary_package(&self, name: &str, file: impl AsRef<Path>) -> Result<bool> {
        self.installer().install_binary(name, file.as_ref())
    }

    pub fn replace_binary_package(
        &self,
        name: &str,
        file: impl AsRef<Path>,
        new_name: Option<&str>,
    ) -> Result<bool> {
        self.installer().replace_binary(name, file.as_ref(), new_name)
    }

    pub fn remove_binary_package(&self, name: &str) -> Result<bool> {
        self.installer().remove_binary(name)
    }

    pub fn change_class_identifier_of_object(
        &self,
        object_id: i64,
        class_identifier: &str,
    ) -> Result<()> {
        ClassReassigner::new(self.objects, self.classes).change_class(object_id, class_identifier)
    }
}
