// src/packages/mod.rs

//! Content-class packages
//!
//! A package exists in two forms: a binary `.ezpkg` archive for distribution
//! and an exploded text tree (`package.xml` plus `ezcontentclass/class-*.xml`)
//! for editing and version control. This module converts between them and
//! loads the text form for installation.

pub mod archive;
pub mod classes;
pub mod loader;
pub mod manifest;
pub mod package;
pub mod resolve;
pub mod traits;
pub mod xml;

pub use archive::{ArchiveExtractor, ExtractedArchive};
pub use classes::{ClassDefinition, find_class_definitions, transform_all};
pub use loader::PackageLoader;
pub use manifest::{InstallItem, ManifestDocument, PackageParameters};
pub use package::Package;
pub use resolve::{
    ArchiveName, PackageLocation, package_name_from_archive_filename,
    package_path_from_archive_filename, parse_archive_name, resolve_from_directory,
};
pub use traits::{
    ClassTransformer, ContentClass, ContentClassStore, ContentObject, ContentObjectStore,
    PackageRegistry,
};
