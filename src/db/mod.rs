// src/db/mod.rs

//! SQLite-backed local repository
//!
//! The database is created with `init`, opened with `open`, and schema
//! changes go through `schema::migrate`. `LocalRepository` wraps a
//! connection and implements the repository-side collaborator traits.

pub mod models;
pub mod paths;
pub mod repository;
pub mod schema;

pub use repository::LocalRepository;

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::info;

/// Create the database (and its directory) and bring the schema up to date
pub fn init(db_path: impl AsRef<Path>) -> Result<()> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    info!("Database ready at {}", db_path.display());
    Ok(())
}

/// Open an existing database
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if !db_path.exists() {
        return Err(Error::InvalidPath(format!(
            "database {} does not exist, run `ezpkg init` first",
            db_path.display()
        )));
    }

    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}
