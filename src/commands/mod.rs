// src/commands/mod.rs
//! Command handlers for the ezpkg CLI

mod binary;
mod content;
mod extract;
mod install;
pub mod progress;

pub use binary::{cmd_install_binary, cmd_remove_binary, cmd_replace_binary};
pub use content::cmd_change_class;
pub use extract::cmd_extract;
pub use install::{cmd_install, cmd_uninstall};

use crate::cli::GlobalArgs;
use anyhow::{Context, Result};
use ezpkg::db::paths;
use ezpkg::{CommandTransformer, Config, LocalRepository, Migrator};
use tracing::info;

/// Read the configuration and apply command-line overrides
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref())?;

    if let Some(db_path) = &global.db_path {
        config.repository.database = db_path.clone();
    }
    if let Some(log_file) = &global.log_file {
        config.log.file = Some(log_file.clone());
    }
    if let Some(user_id) = global.user_id {
        config.install.user_id = user_id;
    }
    if let Some(command) = &global.transformer {
        config.transform.command = Some(command.clone());
    }

    config.validate()?;
    Ok(config)
}

pub(crate) fn open_repository(config: &Config) -> Result<LocalRepository> {
    LocalRepository::open(config.database(), config.package_root()).with_context(|| {
        format!(
            "Failed to open repository database {}",
            config.database().display()
        )
    })
}

pub(crate) fn migrator<'a>(
    repository: &'a LocalRepository,
    config: &Config,
    transformer: Option<&'a CommandTransformer>,
) -> Migrator<'a> {
    let mut migrator = Migrator::new(repository)
        .with_options(config.install_options())
        .with_principal(config.principal());
    if let Some(dir) = config.lock_dir() {
        migrator = migrator.with_lock_dir(dir);
    }
    if let Some(transformer) = transformer {
        migrator = migrator.with_transformer(transformer);
    }
    migrator
}

/// Create or upgrade the repository database
pub fn cmd_init(config: &Config) -> Result<()> {
    let db_path = config.database();
    info!("Initializing repository database at {}", db_path.display());
    ezpkg::db::init(db_path)?;

    std::fs::create_dir_all(config.package_root()).with_context(|| {
        format!("Failed to create {}", config.package_root().display())
    })?;
    if let Some(lock_dir) = config.lock_dir() {
        std::fs::create_dir_all(&lock_dir)
            .with_context(|| format!("Failed to create {}", lock_dir.display()))?;
    }

    println!("Repository initialized at {}", paths::db_dir(db_path).display());
    Ok(())
}

/// List registered packages
pub fn cmd_list(config: &Config) -> Result<()> {
    let repository = open_repository(config)?;
    let records = repository.packages()?;

    if records.is_empty() {
        println!("No packages registered.");
        return Ok(());
    }

    println!("Registered packages:");
    for record in &records {
        let version = match (&record.version, &record.release) {
            (Some(v), Some(r)) => format!("{}-{}", v, r),
            (Some(v), None) => v.clone(),
            _ => "-".to_string(),
        };
        let state = if record.installed {
            "installed"
        } else {
            "registered"
        };
        println!(
            "  {} {} [{}] {}",
            record.name,
            version,
            state,
            record.repository_path.display()
        );
        if let Some(at) = &record.installed_at {
            println!("    installed {}", at);
        }
    }
    println!("\nTotal: {} package(s)", records.len());
    Ok(())
}
