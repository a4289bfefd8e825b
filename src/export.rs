//! CSV export of a heatmap selection.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::debug;

use crate::heatmap::HeatmapResult;

pub const LEADING_COLUMNS: [&str; 3] = ["Student Number", "Student Name", "Module(s)"];
pub const TRAILING_COLUMNS: [&str; 2] = ["Total Absences", "Absence Rate (%)"];

/// Header followed by one record per row, all as plain strings.
pub fn to_records(result: &HeatmapResult) -> Vec<Vec<String>> {
    let mut records = Vec::with_capacity(result.rows.len() + 1);

    let header: Vec<String> = LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(result.weeks.iter().cloned())
        .chain(TRAILING_COLUMNS.iter().map(|c| c.to_string()))
        .collect();
    records.push(header);

    for row in &result.rows {
        let mut record = vec![row.id.clone(), row.name.clone(), result.module.clone()];
        record.extend(result.weeks.iter().map(|week| row.flag(week).to_string()));
        record.push(row.total.to_string());
        record.push(row.rate_percent.to_string());
        records.push(record);
    }

    records
}

/// Writes the table with standard quoting: fields holding a comma, quote or line
/// break are quoted and inner quotes doubled.
pub fn write_csv<W: Write>(writer: W, result: &HeatmapResult) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for record in to_records(result) {
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// `heatmap_<module>.csv`, with path separators in the module name replaced.
pub fn default_file_name(module: &str) -> PathBuf {
    let safe: String = module
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    PathBuf::from(format!("heatmap_{safe}.csv"))
}

pub fn write_csv_file(path: &Path, result: &HeatmapResult) -> Result<()> {
    debug!(path = %path.display(), rows = result.rows.len(), "Writing heatmap CSV");
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(file, result)
}
