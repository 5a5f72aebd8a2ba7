use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};

use crate::records::Batch;

/// Append a batch to the CSV at `destination`. The header is written only
/// when the file is missing or empty; existing rows are never rewritten.
pub fn append(batch: &Batch, destination: &Path) -> Result<usize> {
    let has_content = std::fs::metadata(destination)
        .map(|m| m.len() > 0)
        .unwrap_or(false);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)
        .with_context(|| format!("Failed to open {}", destination.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!has_content)
        .from_writer(file);

    for record in &batch.records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write {} rows", batch.region))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", destination.display()))?;

    Ok(batch.len())
}
