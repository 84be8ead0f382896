// src/commands/binary.rs
//! Binary package registration commands

use super::{migrator, open_repository};
use anyhow::Result;
use ezpkg::Config;
use std::path::Path;

/// Register and install a binary package under `name`
pub fn cmd_install_binary(config: &Config, name: &str, file: &Path) -> Result<()> {
    let repository = open_repository(config)?;
    let migrator = migrator(&repository, config, None);

    if migrator.install_binary_package(name, file)? {
        println!("Installed {} from {}", name, file.display());
    } else {
        println!("Nothing installed for {}", name);
    }
    Ok(())
}

/// Replace the registered package `name` with `file`
pub fn cmd_replace_binary(
    config: &Config,
    name: &str,
    file: &Path,
    new_name: Option<&str>,
) -> Result<()> {
    let repository = open_repository(config)?;
    let migrator = migrator(&repository, config, None);

    if migrator.replace_binary_package(name, file, new_name)? {
        println!(
            "Replaced {} with {} from {}",
            name,
            new_name.unwrap_or(name),
            file.display()
        );
    } else {
        println!("{} left unchanged", name);
    }
    Ok(())
}

/// Remove the registered package `name`
pub fn cmd_remove_binary(config: &Config, name: &str) -> Result<()> {
    let repository = open_repository(config)?;
    let migrator = migrator(&repository, config, None);

    if migrator.remove_binary_package(name)? {
        println!("Removed {}", name);
    } else {
        println!("Package {} is not registered", name);
    }
    Ok(())
}
