// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::fmt;

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        eprintln!("warning: cannot create log directory {}: {}", parent.display(), e);
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("warning: cannot open log file {}: {}", path.display(), e);
            None
        }
    }
}

/// Everything goes to the log file at debug; the console shows warnings,
/// or info with --verbose, unless RUST_LOG says otherwise
fn init_logging(log_file: &Path, verbose: bool) {
    let file_layer = open_log_file(log_file).map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_filter(LevelFilter::DEBUG)
    });

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(&cli.global)?;

    init_logging(&config.log_file(), cli.global.verbose);
    debug!("Using database {}", config.database().display());

    match cli.command {
        Commands::Init => commands::cmd_init(&config),
        Commands::Extract { pattern } => commands::cmd_extract(&config, &pattern),
        Commands::Install {
            package,
            no_version_check,
        } => commands::cmd_install(&config, &package, !no_version_check),
        Commands::Uninstall { package } => commands::cmd_uninstall(&config, &package),
        Commands::InstallBinary { name, file } => {
            commands::cmd_install_binary(&config, &name, &file)
        }
        Commands::ReplaceBinary {
            name,
            file,
            new_name,
        } => commands::cmd_replace_binary(&config, &name, &file, new_name.as_deref()),
        Commands::RemoveBinary { name } => commands::cmd_remove_binary(&config, &name),
        Commands::ChangeClass {
            object_id,
            class_identifier,
        } => commands::cmd_change_class(&config, object_id, &class_identifier),
        Commands::List => commands::cmd_list(&config),
    }
}
