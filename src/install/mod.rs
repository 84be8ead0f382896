// src/install/mod.rs

//! Installing and uninstalling packages through the repository registry
//!
//! Every call builds a fresh `InstallParameters` from the configured
//! `InstallOptions`, the acting `Principal` and the package's own language
//! map, then hands the package to the registry. Install and uninstall
//! outcomes come back as booleans and are always logged; only structural
//! problems with binary package files are raised as errors.

pub mod lock;

pub use lock::PackageLock;

use crate::error::Result;
use crate::packages::package::Package;
use crate::packages::traits::PackageRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// The user on whose behalf packages are installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
}

impl Principal {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Site-wide installation settings, read from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallOptions {
    pub site_access_map: BTreeMap<String, String>,
    pub top_nodes_map: BTreeMap<String, String>,
    pub design_map: BTreeMap<String, String>,
    pub restore_dates: bool,
    pub non_interactive: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            site_access_map: wildcard("site"),
            top_nodes_map: wildcard("2"),
            design_map: wildcard("standard"),
            restore_dates: true,
            non_interactive: true,
        }
    }
}

fn wildcard(value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("*".to_string(), value.to_string())])
}

/// Parameters for a single install or uninstall call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallParameters {
    pub site_access_map: BTreeMap<String, String>,
    pub top_nodes_map: BTreeMap<String, String>,
    pub design_map: BTreeMap<String, String>,
    pub restore_dates: bool,
    pub user_id: i64,
    pub non_interactive: bool,
    pub language_map: BTreeMap<String, String>,
}

impl InstallParameters {
    pub fn build(options: &InstallOptions, package: &Package, principal: Principal) -> Self {
        Self {
            site_access_map: options.site_access_map.clone(),
            top_nodes_map: options.top_nodes_map.clone(),
            design_map: options.design_map.clone(),
            restore_dates: options.restore_dates,
            user_id: principal.user_id,
            non_interactive: options.non_interactive,
            language_map: package.default_language_map(),
        }
    }
}

/// Drives the registry's install API
pub struct Installer<'a> {
    registry: &'a dyn PackageRegistry,
    options: InstallOptions,
    principal: Principal,
    lock_dir: Option<PathBuf>,
}

impl<'a> Installer<'a> {
    pub fn new(registry: &'a dyn PackageRegistry, options: InstallOptions, principal: Principal) -> Self {
        Self {
            registry,
            options,
            principal,
            lock_dir: None,
        }
    }

    /// Serialize operations per package name through lock files in `dir`
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    fn lock(&self, name: &str) -> Result<Option<PackageLock>> {
        match &self.lock_dir {
            Some(dir) => PackageLock::acquire(dir, name).map(Some),
            None => Ok(None),
        }
    }

    fn lock_all(&self, names: &[&str]) -> Result<Vec<PackageLock>> {
        match &self.lock_dir {
            Some(dir) => PackageLock::acquire_all(dir, names),
            None => Ok(Vec::new()),
        }
    }

    fn parameters(&self, package: &Package) -> InstallParameters {
        InstallParameters::build(&self.options, package, self.principal)
    }

    /// Install a loaded package
    ///
    /// With `check_version`, classes whose installed version is equal or
    /// newer are left alone. Returns `false` when there is no package or the
    /// registry reports failure.
    pub fn install(&self, package: Option<&mut Package>, check_version: bool) -> bool {
        let Some(package) = package else {
            error!("Install requested but no package is loaded");
            return false;
        };

        let _guard = match self.lock(package.name()) {
            Ok(guard) => guard,
            Err(e) => {
                error!("Install of '{}' aborted: {}", package.name(), e);
                return false;
            }
        };

        let params = self.parameters(package);
        package.check_for_installed_version = check_version;

        match self.registry.install(package, &params) {
            Ok(true) => {
                package.is_installed = true;
                info!(
                    "Installed package '{}' from {}",
                    package.name(),
                    package.repository_path().display()
                );
                true
            }
            Ok(false) => {
                warn!("Package '{}' was not installed", package.name());
                false
            }
            Err(e) => {
                error!("Install of '{}' failed: {}", package.name(), e);
                false
            }
        }
    }

    /// Uninstall a loaded package
    ///
    /// The repository refuses while content objects of the package's classes
    /// exist; that refusal is returned as `false`.
    pub fn uninstall(&self, package: Option<&mut Package>) -> bool {
        let Some(package) = package else {
            error!("Uninstall requested but no package is loaded");
            return false;
        };

        let _guard = match self.lock(package.name()) {
            Ok(guard) => guard,
            Err(e) => {
                error!("Uninstall of '{}' aborted: {}", package.name(), e);
                return false;
            }
        };

        let params = self.parameters(package);
        package.is_installed = true;

        match self.registry.uninstall(package, &params) {
            Ok(true) => {
                package.is_installed = false;
                info!("Uninstalled package '{}'", package.name());
                true
            }
            Ok(false) => {
                warn!("Package '{}' was not uninstalled", package.name());
                false
            }
            Err(e) => {
                error!("Uninstall of '{}' failed: {}", package.name(), e);
                false
            }
        }
    }

    /// Register and install a binary package under `name`
    ///
    /// A missing file is logged and ignored. The archive is read before any
    /// existing record is touched, so a broken archive leaves the old
    /// package in place.
    pub fn install_binary(&self, name: &str, file: &Path) -> Result<bool> {
        if !file.exists() {
            warn!(
                "Binary package {} does not exist, nothing installed",
                file.display()
            );
            return Ok(false);
        }

        let _guard = self.lock(name)?;
        let package = self.registry.fetch_archive(file, name)?;
        let previous: Vec<Package> = self.registry.fetch(name)?.into_iter().collect();
        self.commit_binary(&previous, &package)
    }

    /// Replace package `name` with the contents of `file`, registered as
    /// `new_name` when given
    ///
    /// A package already registered as `new_name` is replaced as well.
    pub fn replace_binary(&self, name: &str, file: &Path, new_name: Option<&str>) -> Result<bool> {
        if !file.exists() {
            warn!(
                "Binary package {} does not exist, '{}' left in place",
                file.display(),
                name
            );
            return Ok(false);
        }

        let target = new_name.unwrap_or(name);
        let _guards = self.lock_all(&[name, target])?;

        let package = self.registry.fetch_archive(file, target)?;
        let mut previous: Vec<Package> = self.registry.fetch(name)?.into_iter().collect();
        if target != name
            && let Some(existing) = self.registry.fetch(target)?
        {
            previous.push(existing);
        }
        self.commit_binary(&previous, &package)
    }

    fn commit_binary(&self, previous: &[Package], package: &Package) -> Result<bool> {
        let params = self.parameters(package);
        for previous in previous {
            info!(
                "Replacing package '{}' with '{}'",
                previous.name(),
                package.name()
            );
        }

        let installed = self.registry.replace(previous, package, &params)?;
        if installed {
            info!("Installed binary package '{}'", package.name());
        } else {
            warn!("Binary package '{}' was not installed", package.name());
        }
        Ok(installed)
    }

    /// Remove the registered package `name`; absent packages are a no-op
    pub fn remove_binary(&self, name: &str) -> Result<bool> {
        let _guard = self.lock(name)?;
        match self.registry.fetch(name)? {
            Some(package) => {
                self.registry.remove(&package)?;
                info!("Removed package '{}'", name);
                Ok(true)
            }
            None => {
                info!("Package '{}' is not registered, nothing to remove", name);
                Ok(false)
            }
        }
    }
}
