// src/cli/mod.rs
//! CLI definitions for ezpkg
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ezpkg")]
#[command(version)]
#[command(about = "Migrate content-class packages between archive and text form", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the repository database
    #[arg(short, long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Diagnostic log file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Act as this user when installing
    #[arg(long, global = true)]
    pub user_id: Option<i64>,

    /// Class-definition transformer command
    #[arg(long, global = true, value_name = "COMMAND")]
    pub transformer: Option<String>,

    /// Also log to the console
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// A text package: its directory, or repository plus name
#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// Package directory (containing package.xml)
    #[arg(required_unless_present = "repository", conflicts_with_all = ["repository", "name"])]
    pub path: Option<PathBuf>,

    /// Repository directory holding the package
    #[arg(long, requires = "name")]
    pub repository: Option<PathBuf>,

    /// Package name inside the repository
    #[arg(long, requires = "repository")]
    pub name: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or upgrade the repository database
    Init,

    /// Extract binary packages matching a pattern and transform their classes
    Extract {
        /// File pattern, e.g. "packages/*.ezpkg"
        pattern: String,
    },

    /// Install a text package
    Install {
        #[command(flatten)]
        package: PackageArgs,

        /// Replace classes even when the installed version is the same or newer
        #[arg(long)]
        no_version_check: bool,
    },

    /// Uninstall a text package
    Uninstall {
        #[command(flatten)]
        package: PackageArgs,
    },

    /// Register and install a binary package
    InstallBinary {
        /// Name to register the package under
        name: String,
        /// Binary package file
        file: PathBuf,
    },

    /// Replace a registered package with a binary package
    ReplaceBinary {
        /// Registered package to replace
        name: String,
        /// Binary package file
        file: PathBuf,
        /// Register the new package under this name
        #[arg(long)]
        new_name: Option<String>,
    },

    /// Remove a registered package
    RemoveBinary {
        /// Registered package name
        name: String,
    },

    /// Move a content object to another class
    ChangeClass {
        /// Content object id
        object_id: i64,
        /// Identifier of the target class
        class_identifier: String,
    },

    /// List registered packages
    List,
}
