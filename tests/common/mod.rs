// tests/common/mod.rs

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use ezpkg::LocalRepository;
use ezpkg::db;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A class definition document with the given identifier and version
pub fn class_xml(identifier: &str, modified: i64) -> String {
    format!(
        "<content-class><name>{0}</name><identifier>{0}</identifier>\
         <modified>{1}</modified></content-class>",
        identifier, modified
    )
}

pub fn manifest_xml(name: &str) -> String {
    format!(
        "<package><name>{}</name><version-number>1.0</version-number>\
         <release-number>1</release-number></package>",
        name
    )
}

/// Write a gzip-compressed `.ezpkg` archive holding a manifest and classes
pub fn build_archive(path: &Path, name: &str, classes: &[(&str, i64)]) {
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let mut add = |entry: &str, body: &str| {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, entry, body.as_bytes()).unwrap();
    };

    add("package.xml", &manifest_xml(name));
    for (identifier, modified) in classes {
        add(
            &format!("ezcontentclass/class-{}.xml", identifier),
            &class_xml(identifier, *modified),
        );
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Write an exploded text package at `repository/name`
pub fn write_text_package(repository: &Path, name: &str, classes: &[(&str, i64)]) -> PathBuf {
    let dir = repository.join(name);
    fs::create_dir_all(dir.join("ezcontentclass")).unwrap();
    fs::write(dir.join("package.xml"), manifest_xml(name)).unwrap();
    for (identifier, modified) in classes {
        fs::write(
            dir.join("ezcontentclass")
                .join(format!("class-{}.xml", identifier)),
            class_xml(identifier, *modified),
        )
        .unwrap();
    }
    dir
}

/// A freshly initialised repository in a temporary directory.
///
/// Returns (TempDir, repository) - keep the TempDir alive to prevent cleanup.
pub fn setup_repository() -> (TempDir, LocalRepository) {
    let temp_dir = tempfile::tempdir().unwrap();
    db::init(db_path(&temp_dir)).unwrap();
    fs::create_dir_all(package_root(&temp_dir)).unwrap();
    let repository = open_repository(temp_dir.path());
    (temp_dir, repository)
}

pub fn db_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("db").join("ezpkg.db")
}

pub fn package_root(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("packages")
}

/// Another connection to the repository set up by `setup_repository`
pub fn open_repository(root: &Path) -> LocalRepository {
    LocalRepository::open(root.join("db").join("ezpkg.db"), root.join("packages")).unwrap()
}

/// Entries directly under `dir`
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
