// src/commands/extract.rs
//! Binary-to-text package extraction

use super::progress::CliProgress;
use super::{migrator, open_repository};
use anyhow::Result;
use ezpkg::{Config, LogProgress, ProgressTracker};
use std::io::IsTerminal;
use tracing::info;

/// An indicatif bar on a terminal, log lines otherwise
fn progress() -> Box<dyn ProgressTracker> {
    if std::io::stderr().is_terminal() {
        Box::new(CliProgress::new("Extracting"))
    } else {
        Box::new(LogProgress::new("extract", 0))
    }
}

/// Extract every archive matching `pattern` and transform its classes
pub fn cmd_extract(config: &Config, pattern: &str) -> Result<()> {
    let repository = open_repository(config)?;
    let transformer = config.transformer()?;
    let migrator = migrator(&repository, config, transformer.as_ref());

    info!("Extracting packages matching {}", pattern);
    let progress = progress();
    let report = migrator.extract_and_transform(pattern, progress.as_ref())?;

    for package in &report.packages {
        println!("Extracted {}", package.display());
    }
    if report.skipped > 0 {
        println!("Skipped {} file(s) that are not .ezpkg archives", report.skipped);
    }
    println!(
        "{} package(s), {} class definition(s), {} transformed",
        report.packages.len(),
        report.definitions,
        report.transformed
    );
    Ok(())
}
