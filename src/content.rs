// src/content.rs

//! Reassigning content objects to another class

use crate::error::{Error, Result};
use crate::packages::traits::{ContentClassStore, ContentObjectStore};
use tracing::info;

pub struct ClassReassigner<'a> {
    objects: &'a dyn ContentObjectStore,
    classes: &'a dyn ContentClassStore,
}

impl<'a> ClassReassigner<'a> {
    pub fn new(objects: &'a dyn ContentObjectStore, classes: &'a dyn ContentClassStore) -> Self {
        Self { objects, classes }
    }

    /// Point object `object_id` at the class `class_identifier`
    ///
    /// Both references are resolved before anything is written. Attribute
    /// data is left as is; only the class link changes.
    pub fn change_class(&self, object_id: i64, class_identifier: &str) -> Result<()> {
        let mut object = self.objects.fetch_object(object_id)?.ok_or_else(|| {
            Error::InvalidReference(format!("no content object with id {}", object_id))
        })?;
        let class = self
            .classes
            .fetch_class_by_identifier(class_identifier)?
            .ok_or_else(|| {
                Error::InvalidReference(format!(
                    "no content class with identifier '{}'",
                    class_identifier
                ))
            })?;

        let previous = object.class_identifier.clone();
        object.set_class(&class);
        self.objects.store_object(&object)?;
        self.objects.invalidate_cache(object.id)?;

        info!(
            "Object {} ('{}') moved from class '{}' to '{}'",
            object.id, object.name, previous, class.identifier
        );
        Ok(())
    }
}
