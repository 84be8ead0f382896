// src/lib.rs

//! ezpkg: content-class package migration
//!
//! Converts content-class packages between their binary `.ezpkg` archive
//! form and the exploded text form (`package.xml` plus class-definition
//! XML documents), and drives installation of text packages into a content
//! repository.
//!
//! # Architecture
//!
//! - `packages`: locating, extracting, scanning and loading packages
//! - `install`: the installer and its per-call parameters
//! - `content`: moving content objects between classes
//! - `migrate`: the `Migrator` facade tying the above together
//! - `db`: a SQLite repository implementing the collaborator traits

pub mod config;
pub mod content;
pub mod db;
mod error;
pub mod filesystem;
pub mod install;
pub mod migrate;
pub mod packages;
pub mod progress;
pub mod transform;

pub use config::Config;
pub use content::ClassReassigner;
pub use db::LocalRepository;
pub use error::{Error, LoadError, Result};
pub use install::{InstallOptions, InstallParameters, Installer, PackageLock, Principal};
pub use migrate::{ExtractReport, Migrator};
pub use packages::{
    ArchiveExtractor, ArchiveName, ClassTransformer, ContentClass, ContentClassStore,
    ContentObject, ContentObjectStore, Package, PackageLoader, PackageRegistry,
};
pub use progress::{LogProgress, ProgressTracker, SilentProgress};
pub use transform::CommandTransformer;
