// src/packages/archive.rs

//! Binary package extraction
//!
//! `.ezpkg` archives are tar streams, normally zlib/gzip compressed. Entries
//! are unpacked into a staging directory next to the destination and moved
//! into place once the whole archive has been read, so a corrupt archive
//! never leaves a half-written package behind. Files already present at the
//! destination are overwritten; the source archive is only ever read.

use crate::error::{Error, Result};
use crate::filesystem::path::{move_file, safe_join, sanitize_path};
use crate::packages::resolve::package_path_from_archive_filename;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Stream-scheme prefix accepted in front of archive paths
pub const ZLIB_STREAM_SCHEME: &str = "compress.zlib://";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Outcome of a successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArchive {
    pub destination: PathBuf,
    pub files: usize,
}

/// Strip an optional `compress.zlib://` scheme from an archive address
pub fn archive_source_path(archive: &Path) -> PathBuf {
    let raw = archive.to_string_lossy();
    match raw.strip_prefix(ZLIB_STREAM_SCHEME) {
        Some(rest) => PathBuf::from(rest),
        None => archive.to_path_buf(),
    }
}

/// Extracts binary package archives into directory trees
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract `archive` into `destination`, creating it if needed
    pub fn extract(
        &self,
        archive: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<ExtractedArchive> {
        let archive = archive_source_path(archive.as_ref());
        let destination = destination.as_ref();

        let has_name = destination
            .file_name()
            .map(|n| !n.is_empty())
            .unwrap_or(false);
        if !has_name {
            return Err(Error::ArchiveError(format!(
                "empty package name for destination '{}'",
                destination.display()
            )));
        }

        if !archive.is_file() {
            return Err(Error::ArchiveError(format!(
                "archive does not exist: {}",
                archive.display()
            )));
        }

        fs::create_dir_all(destination).map_err(|e| {
            Error::ArchiveError(format!(
                "cannot create {}: {}",
                destination.display(),
                e
            ))
        })?;

        let staging_parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let staging = tempfile::Builder::new()
            .prefix(".ezpkg-stage-")
            .tempdir_in(staging_parent)
            .map_err(|e| {
                Error::ArchiveError(format!(
                    "cannot create staging directory in {}: {}",
                    staging_parent.display(),
                    e
                ))
            })?;

        let unpacked = unpack_into(&archive, staging.path())?;
        commit_staging(staging.path(), destination)?;

        info!(
            "Extracted {} files from {} into {}",
            unpacked,
            archive.display(),
            destination.display()
        );

        Ok(ExtractedArchive {
            destination: destination.to_path_buf(),
            files: unpacked,
        })
    }

    /// Extract an archive next to itself, into `<dir>/<package name>`
    pub fn extract_package(&self, archive: impl AsRef<Path>) -> Result<ExtractedArchive> {
        let source = archive_source_path(archive.as_ref());
        let destination = package_path_from_archive_filename(&source)?;
        self.extract(&source, &destination)
    }
}

fn open_archive(path: &Path) -> Result<Archive<Box<dyn Read>>> {
    let mut file = File::open(path).map_err(|e| {
        Error::ArchiveError(format!("cannot open {}: {}", path.display(), e))
    })?;

    let mut magic = [0u8; 2];
    let read = file.read(&mut magic).map_err(|e| {
        Error::ArchiveError(format!("cannot read {}: {}", path.display(), e))
    })?;
    file.seek(SeekFrom::Start(0)).map_err(|e| {
        Error::ArchiveError(format!("cannot rewind {}: {}", path.display(), e))
    })?;

    let reader: Box<dyn Read> = if read == GZIP_MAGIC.len() && magic == GZIP_MAGIC {
        Box::new(GzDecoder::new(file))
    } else {
        debug!("{} is not gzip compressed, reading as plain tar", path.display());
        Box::new(file)
    };

    Ok(Archive::new(reader))
}

/// Unpack every entry of `archive` below `staging`, returning the file count
fn unpack_into(archive: &Path, staging: &Path) -> Result<usize> {
    let mut tar = open_archive(archive)?;
    let mut files = 0;

    let entries = tar.entries().map_err(|e| {
        Error::ArchiveError(format!("cannot read {}: {}", archive.display(), e))
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| {
            Error::ArchiveError(format!("corrupt archive {}: {}", archive.display(), e))
        })?;

        let raw_path = entry
            .path()
            .map_err(|e| Error::ArchiveError(format!("bad entry path: {}", e)))?
            .into_owned();

        let relative = match sanitize_path(&raw_path) {
            Ok(relative) => relative,
            // The archive root ("./") carries no content of its own.
            Err(Error::InvalidPath(_)) if entry.header().entry_type().is_dir() => continue,
            Err(e) => {
                return Err(Error::ArchiveError(format!(
                    "refusing entry in {}: {}",
                    archive.display(),
                    e
                )));
            }
        };

        let is_file = entry.header().entry_type().is_file();
        let unpacked = entry.unpack_in(staging).map_err(|e| {
            Error::ArchiveError(format!(
                "cannot unpack {} from {}: {}",
                relative.display(),
                archive.display(),
                e
            ))
        })?;

        if unpacked && is_file {
            files += 1;
        }
    }

    Ok(files)
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::ArchiveError(format!("cannot create {}: {}", dir.display(), e)))
}

/// Move the staged tree over `destination`
fn commit_staging(staging: &Path, destination: &Path) -> Result<()> {
    for item in WalkDir::new(staging).min_depth(1) {
        let item = item.map_err(|e| Error::ArchiveError(format!("cannot walk staging: {}", e)))?;
        let relative = item
            .path()
            .strip_prefix(staging)
            .map_err(|e| Error::ArchiveError(format!("staging path: {}", e)))?;
        let target = safe_join(destination, relative)
            .map_err(|e| Error::ArchiveError(format!("staging path: {}", e)))?;

        if item.file_type().is_dir() {
            create_dir(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        move_file(item.path(), &target).map_err(|e| {
            Error::ArchiveError(format!("cannot place {}: {}", target.display(), e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    fn build_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extract_creates_destination_tree() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("blog-1.0-1.ezpkg");
        build_archive(
            &archive,
            &[
                ("package.xml", "<package/>"),
                ("ezcontentclass/class-article.xml", "<content-class/>"),
            ],
        );

        let destination = temp.path().join("nested/repo/blog");
        let result = ArchiveExtractor::new().extract(&archive, &destination).unwrap();

        assert_eq!(result.files, 2);
        assert!(destination.join("package.xml").is_file());
        assert!(destination.join("ezcontentclass/class-article.xml").is_file());
        assert!(archive.is_file());
    }

    #[test]
    fn test_extract_overwrites_existing_files() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("blog.ezpkg");
        build_archive(&archive, &[("package.xml", "<package>new</package>")]);

        let destination = temp.path().join("blog");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("package.xml"), "old").unwrap();
        fs::write(destination.join("local.txt"), "kept").unwrap();

        ArchiveExtractor::new().extract(&archive, &destination).unwrap();

        assert_eq!(
            fs::read_to_string(destination.join("package.xml")).unwrap(),
            "<package>new</package>"
        );
        assert!(destination.join("local.txt").is_file());
    }

    #[test]
    fn test_extract_package_uses_archive_name() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("forum-2.0-3.ezpkg");
        build_archive(&archive, &[("package.xml", "<package/>")]);

        let result = ArchiveExtractor::new().extract_package(&archive).unwrap();
        assert_eq!(result.destination, temp.path().join("forum"));
        assert!(temp.path().join("forum/package.xml").is_file());
    }

    #[test]
    fn test_extract_accepts_stream_scheme() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("blog.ezpkg");
        build_archive(&archive, &[("package.xml", "<package/>")]);

        let uri = format!("{}{}", ZLIB_STREAM_SCHEME, archive.display());
        let destination = temp.path().join("blog");
        ArchiveExtractor::new().extract(&uri, &destination).unwrap();
        assert!(destination.join("package.xml").is_file());
    }

    #[test]
    fn test_extract_missing_archive() {
        let temp = TempDir::new().unwrap();
        let err = ArchiveExtractor::new()
            .extract(temp.path().join("none.ezpkg"), temp.path().join("none"))
            .unwrap_err();
        assert!(matches!(err, Error::ArchiveError(_)));
        assert!(!temp.path().join("none").exists());
    }

    #[test]
    fn test_extract_rejects_empty_name() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("blog.ezpkg");
        build_archive(&archive, &[("package.xml", "<package/>")]);

        let err = ArchiveExtractor::new().extract(&archive, "/").unwrap_err();
        assert!(matches!(err, Error::ArchiveError(_)));
    }

    #[test]
    fn test_extract_corrupt_archive_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.ezpkg");
        let mut bytes = GZIP_MAGIC.to_vec();
        bytes.extend_from_slice(b"definitely not deflate data");
        fs::write(&archive, bytes).unwrap();

        let destination = temp.path().join("broken");
        let err = ArchiveExtractor::new().extract(&archive, &destination).unwrap_err();
        assert!(matches!(err, Error::ArchiveError(_)));
        assert_eq!(fs::read_dir(&destination).unwrap().count(), 0);
    }

    #[test]
    fn test_extract_blocked_directory_is_archive_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("blog.ezpkg");
        build_archive(
            &archive,
            &[("ezcontentclass/class-article.xml", "<content-class/>")],
        );

        // A plain file where the archive needs a directory
        let destination = temp.path().join("blog");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("ezcontentclass"), "in the way").unwrap();

        let err = ArchiveExtractor::new().extract(&archive, &destination).unwrap_err();
        assert!(matches!(err, Error::ArchiveError(_)));
    }

    #[test]
    fn test_extract_plain_tar() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("plain.ezpkg");
        let mut builder = tar::Builder::new(File::create(&archive).unwrap());
        let mut header = tar::Header::new_gnu();
        header.set_size(10);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "package.xml", "<package/>".as_bytes())
            .unwrap();
        builder.finish().unwrap();

        let destination = temp.path().join("plain");
        let result = ArchiveExtractor::new().extract(&archive, &destination).unwrap();
        assert_eq!(result.files, 1);
    }
}
