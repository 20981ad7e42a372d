use crate::dataset::labeled::LabeledDataset;
use crate::dataset::table::RawTable;
use crate::error::{AppError, Result};
use crate::models::Attribute;
use std::path::Path;
use tracing::info;

/// Load a CSV dataset into a raw table.
///
/// Rows are read flexibly so ragged input reaches the preprocessor, which
/// rejects it with a schema mismatch. Headerless files get synthetic
/// `column_N` headers and are reconciled by position.
pub fn load_csv(path: impl AsRef<Path>, has_headers: bool) -> Result<RawTable> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppError::Dataset(format!("failed to open {}: {}", path.display(), e)))?;

    let mut headers: Vec<String> = if has_headers {
        reader.headers()?.iter().map(String::from).collect()
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(String::from).collect::<Vec<_>>());
    }

    if !has_headers {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        headers = (1..=width).map(|i| format!("column_{}", i)).collect();
    }

    info!(
        path = %path.display(),
        rows = rows.len(),
        columns = headers.len(),
        "Loaded dataset"
    );

    Ok(RawTable::new(headers, rows))
}

/// Write a labeled dataset, including derived and learned columns, as CSV
pub fn write_labeled_csv(dataset: &LabeledDataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    let learned = dataset.learned_labels();
    let mut headers: Vec<&str> = Attribute::ALL.iter().map(|a| a.column_name()).collect();
    headers.push("wss");
    headers.push("stress_level");
    if learned.is_some() {
        headers.push("learned_stress_level");
    }
    writer.write_record(&headers)?;

    for (idx, entry) in dataset.entries().iter().enumerate() {
        let mut row: Vec<String> = entry
            .record
            .values()
            .iter()
            .map(|v| v.to_string())
            .collect();
        row.push(entry.wss.to_string());
        row.push(entry.category.to_string());
        if let Some(labels) = learned {
            row.push(labels[idx].to_string());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = dataset.len(), "Wrote labeled dataset");
    Ok(())
}
