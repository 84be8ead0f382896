// src/db/models/mod.rs

//! Row types of the local repository database

mod content;
mod package_record;

pub use content::{ClassRecord, ObjectRecord, ViewCache};
pub use package_record::PackageRecord;
