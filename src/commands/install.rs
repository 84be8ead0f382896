// src/commands/install.rs
//! Text package install and uninstall

use super::{migrator, open_repository};
use crate::cli::PackageArgs;
use anyhow::{Result, anyhow, bail};
use ezpkg::{Config, Migrator};

fn load(migrator: &mut Migrator<'_>, package: &PackageArgs) -> Result<()> {
    match (&package.path, &package.repository, &package.name) {
        (Some(path), _, _) => {
            if !migrator.load_package_from_directory(path) {
                bail!("Cannot load a package from {}", path.display());
            }
        }
        (None, Some(repository), Some(name)) => migrator.load_package(repository, name)?,
        _ => bail!("Give a package directory, or --repository with --name"),
    }
    Ok(())
}

/// Install a text package
pub fn cmd_install(config: &Config, package: &PackageArgs, check_version: bool) -> Result<()> {
    let repository = open_repository(config)?;
    let mut migrator = migrator(&repository, config, None);
    load(&mut migrator, package)?;

    let name = migrator
        .package()
        .map(|p| p.name().to_string())
        .unwrap_or_default();
    if !migrator.install(check_version) {
        return Err(anyhow!("Installation of '{}' failed, see the log", name));
    }
    println!("Installed {}", name);
    Ok(())
}

/// Uninstall a text package
pub fn cmd_uninstall(config: &Config, package: &PackageArgs) -> Result<()> {
    let repository = open_repository(config)?;
    let mut migrator = migrator(&repository, config, None);
    load(&mut migrator, package)?;

    let name = migrator
        .package()
        .map(|p| p.name().to_string())
        .unwrap_or_default();
    if !migrator.uninstall() {
        return Err(anyhow!(
            "Uninstall of '{}' failed; remove content objects of its classes first",
            name
        ));
    }
    println!("Uninstalled {}", name);
    Ok(())
}
