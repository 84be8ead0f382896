// src/db/models/package_record.rs

//! Registered package records

use crate::error::{Error, Result};
use crate::packages::manifest::PackageParameters;
use crate::packages::package::Package;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::PathBuf;

const COLUMNS: &str = "id, name, version, release, repository_path, parameters, installed, installed_at, installed_by";

/// One row of the `packages` table
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRecord {
    pub id: Option<i64>,
    pub name: String,
    pub version: Option<String>,
    pub release: Option<String>,
    pub repository_path: PathBuf,
    pub parameters: PackageParameters,
    pub installed: bool,
    pub installed_at: Option<String>,
    pub installed_by: Option<i64>,
}

impl PackageRecord {
    pub fn from_package(package: &Package) -> Self {
        let parameters = package.parameters().clone();
        Self {
            id: None,
            name: package.name().to_string(),
            version: parameters.version.clone(),
            release: parameters.release.clone(),
            repository_path: package.repository_path().to_path_buf(),
            parameters,
            installed: package.is_installed,
            installed_at: None,
            installed_by: None,
        }
    }

    /// Rebuild the package handle this record was registered from
    pub fn to_package(&self) -> Package {
        let mut package = Package::new(
            self.name.clone(),
            self.repository_path.clone(),
            self.parameters.clone(),
        );
        package.is_installed = self.installed;
        package
    }

    /// Insert, or overwrite the record of the same name
    pub fn upsert(&mut self, conn: &Connection) -> Result<i64> {
        let parameters = serde_json::to_string(&self.parameters)
            .map_err(|e| Error::ParseError(format!("cannot serialize parameters: {}", e)))?;

        conn.execute(
            "INSERT INTO packages (name, version, release, repository_path, parameters, installed, installed_at, installed_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(name) DO UPDATE SET
                version = excluded.version,
                release = excluded.release,
                repository_path = excluded.repository_path,
                parameters = excluded.parameters,
                installed = excluded.installed,
                installed_at = excluded.installed_at,
                installed_by = excluded.installed_by",
            params![
                &self.name,
                &self.version,
                &self.release,
                self.repository_path.to_string_lossy(),
                parameters,
                self.installed,
                &self.installed_at,
                &self.installed_by,
            ],
        )?;

        let id = conn.query_row(
            "SELECT id FROM packages WHERE name = ?1",
            [&self.name],
            |row| row.get(0),
        )?;
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let sql = format!("SELECT {} FROM packages WHERE name = ?1", COLUMNS);
        let record = conn.query_row(&sql, [name], Self::from_row).optional()?;
        Ok(record)
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let sql = format!("SELECT {} FROM packages ORDER BY name", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn delete_by_name(conn: &Connection, name: &str) -> Result<bool> {
        let deleted = conn.execute("DELETE FROM packages WHERE name = ?1", [name])?;
        Ok(deleted > 0)
    }

    /// Clear the installed flag; returns false when no record matched
    pub fn mark_uninstalled(conn: &Connection, name: &str) -> Result<bool> {
        let rows = conn.execute(
            "UPDATE packages SET installed = 0, installed_at = NULL, installed_by = NULL WHERE name = ?1",
            [name],
        )?;
        Ok(rows > 0)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: String = row.get(5)?;
        let parameters = serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let repository_path: String = row.get(4)?;

        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            version: row.get(2)?,
            release: row.get(3)?,
            repository_path: PathBuf::from(repository_path),
            parameters,
            installed: row.get(6)?,
            installed_at: row.get(7)?,
            installed_by: row.get(8)?,
        })
    }
}
