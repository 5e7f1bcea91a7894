//! Output module for the terminal artifact of a scrape
//!
//! This module handles:
//! - Serializing the collected records as pretty JSON
//! - Recording per-run statistics

mod summary;

pub use summary::ScrapeSummary;

use crate::extract::ProductRecord;
use crate::HarvestError;
use std::io::Write;
use std::path::Path;

/// Serializes records as a pretty-printed JSON array
pub fn records_to_json(records: &[ProductRecord]) -> Result<String, HarvestError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Writes records as pretty JSON to `path`, or to stdout when `None`
pub fn write_json(records: &[ProductRecord], path: Option<&Path>) -> Result<(), HarvestError> {
    let json = records_to_json(records)?;

    match path {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))?;
            tracing::info!("Wrote {} records to {}", records.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
