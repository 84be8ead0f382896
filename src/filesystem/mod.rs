// src/filesystem/mod.rs

//! Filesystem helpers shared by extraction and the local repository

pub mod path;

pub use path::{move_file, safe_join, sanitize_package_name, sanitize_path};
