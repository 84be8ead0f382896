// src/commands/content.rs
//! Content object commands

use super::{migrator, open_repository};
use anyhow::Result;
use ezpkg::Config;

/// Move content object `object_id` to the class `class_identifier`
pub fn cmd_change_class(config: &Config, object_id: i64, class_identifier: &str) -> Result<()> {
    let repository = open_repository(config)?;
    migrator(&repository, config, None).change_class_identifier_of_object(object_id, class_identifier)?;
    println!("Object {} now uses class {}", object_id, class_identifier);
    Ok(())
}
