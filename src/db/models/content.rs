// src/db/models/content.rs

//! Content classes, content objects and their view cache

use crate::error::Result;
use crate::packages::classes::ClassDefinition;
use crate::packages::traits::{ContentClass, ContentObject};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// One row of the `content_classes` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub id: Option<i64>,
    pub identifier: String,
    pub name: String,
    pub remote_id: Option<String>,
    pub modified: i64,
    /// Package that installed the class
    pub package_name: Option<String>,
}

impl ClassRecord {
    pub fn from_definition(definition: &ClassDefinition, package_name: &str) -> Self {
        Self {
            id: None,
            identifier: definition.identifier.clone(),
            name: definition.name.clone(),
            remote_id: definition.remote_id.clone(),
            modified: definition.modified,
            package_name: Some(package_name.to_string()),
        }
    }

    /// Insert, or replace the class with the same identifier in place
    ///
    /// The row id survives a replace so existing objects keep their class.
    pub fn upsert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO content_classes (identifier, name, remote_id, modified, package_name)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(identifier) DO UPDATE SET
                name = excluded.name,
                remote_id = excluded.remote_id,
                modified = excluded.modified,
                package_name = excluded.package_name",
            params![
                &self.identifier,
                &self.name,
                &self.remote_id,
                self.modified,
                &self.package_name,
            ],
        )?;

        let id = conn.query_row(
            "SELECT id FROM content_classes WHERE identifier = ?1",
            [&self.identifier],
            |row| row.get(0),
        )?;
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_identifier(conn: &Connection, identifier: &str) -> Result<Option<Self>> {
        let record = conn
            .query_row(
                "SELECT id, identifier, name, remote_id, modified, package_name
                 FROM content_classes WHERE identifier = ?1",
                [identifier],
                Self::from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn find_by_package(conn: &Connection, package_name: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, identifier, name, remote_id, modified, package_name
             FROM content_classes WHERE package_name = ?1 ORDER BY identifier",
        )?;
        let records = stmt
            .query_map([package_name], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM content_classes WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Number of content objects instantiating this class
    pub fn object_count(conn: &Connection, id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM content_objects WHERE class_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn to_content_class(&self) -> ContentClass {
        ContentClass {
            id: self.id.unwrap_or_default(),
            identifier: self.identifier.clone(),
            name: self.name.clone(),
            modified: self.modified,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            identifier: row.get(1)?,
            name: row.get(2)?,
            remote_id: row.get(3)?,
            modified: row.get(4)?,
            package_name: row.get(5)?,
        })
    }
}

/// Persistence for `ContentObject`
pub struct ObjectRecord;

impl ObjectRecord {
    pub fn insert(conn: &Connection, name: &str, class_id: i64) -> Result<i64> {
        conn.execute(
            "INSERT INTO content_objects (name, class_id) VALUES (?1, ?2)",
            params![name, class_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<ContentObject>> {
        let object = conn
            .query_row(
                "SELECT o.id, o.name, o.class_id, c.identifier
                 FROM content_objects o JOIN content_classes c ON c.id = o.class_id
                 WHERE o.id = ?1",
                [id],
                |row| {
                    Ok(ContentObject {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        class_id: row.get(2)?,
                        class_identifier: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(object)
    }

    /// Write back name and class; returns false when the object is gone
    pub fn update(conn: &Connection, object: &ContentObject) -> Result<bool> {
        let updated = conn.execute(
            "UPDATE content_objects SET name = ?1, class_id = ?2, modified_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            params![&object.name, object.class_id, object.id],
        )?;
        Ok(updated > 0)
    }
}

/// Rendered views of content objects
pub struct ViewCache;

impl ViewCache {
    pub fn put(conn: &Connection, object_id: i64, view: &str, body: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO view_cache (object_id, view, body) VALUES (?1, ?2, ?3)
             ON CONFLICT(object_id, view) DO UPDATE SET body = excluded.body",
            params![object_id, view, body],
        )?;
        Ok(())
    }

    pub fn count_for_object(conn: &Connection, object_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM view_cache WHERE object_id = ?1",
            [object_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn clear_object(conn: &Connection, object_id: i64) -> Result<usize> {
        let cleared = conn.execute("DELETE FROM view_cache WHERE object_id = ?1", [object_id])?;
        Ok(cleared)
    }
}
