use std::path::Path;

use itertools::Itertools;

use crate::{domain::record::Record, error::ScrapeError};

/// Writes all records as one CSV file in a single pass: a header row of
/// every observed field in first-seen order, then one row per record.
/// An existing file is overwritten; an empty run creates no file.
pub fn persist(records: &[Record], path: &Path) -> Result<(), ScrapeError> {
    if records.is_empty() {
        log::warn!("No records were extracted, skipping {}", path.display());
        return Ok(());
    }

    let header: Vec<&str> = records
        .iter()
        .flat_map(|record| record.field_names())
        .unique()
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;

    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|name| {
                record
                    .get(name)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
