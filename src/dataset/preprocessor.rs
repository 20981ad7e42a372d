use crate::dataset::labeled::{LabeledDataset, LabeledRecord, SchemaResolution};
use crate::dataset::table::RawTable;
use crate::error::{AppError, Result};
use crate::models::{normalize_header, Attribute, WorkloadRecord, ATTRIBUTE_COUNT};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Aligns raw tables with the attribute schema and derives WSS/category columns
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// Non-feature identifier columns dropped before schema matching
    identifier_columns: HashSet<String>,

    /// Columns produced by an earlier run, recomputed rather than trusted
    derived_columns: HashSet<String>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(
            &["Faculty_ID".to_string()],
            &[
                "wss".to_string(),
                "stress_level".to_string(),
                "learned_stress_level".to_string(),
            ],
        )
    }
}

impl Preprocessor {
    pub fn new(identifier_columns: &[String], derived_columns: &[String]) -> Self {
        Self {
            identifier_columns: identifier_columns
                .iter()
                .map(|c| normalize_header(c))
                .collect(),
            derived_columns: derived_columns
                .iter()
                .map(|c| normalize_header(c))
                .collect(),
        }
    }

    /// Preprocess a raw table into a labeled dataset
    pub fn preprocess(&self, table: &RawTable) -> Result<LabeledDataset> {
        if let Some((row_idx, width)) = table.first_ragged_row() {
            return Err(AppError::SchemaMismatch {
                expected: table.width(),
                found: width,
                detail: format!("row {} does not match the header width", row_idx + 1),
            });
        }

        let feature_columns: Vec<usize> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, header)| {
                let normalized = normalize_header(header);
                let dropped = self.identifier_columns.contains(&normalized)
                    || self.derived_columns.contains(&normalized);
                if dropped {
                    debug!(column = %header, "Dropping non-feature column");
                }
                !dropped
            })
            .map(|(idx, _)| idx)
            .collect();

        if feature_columns.len() != ATTRIBUTE_COUNT {
            return Err(AppError::SchemaMismatch {
                expected: ATTRIBUTE_COUNT,
                found: feature_columns.len(),
                detail: "feature columns after dropping identifier and derived columns"
                    .to_string(),
            });
        }

        let (mapping, resolution) = self.resolve_columns(table, &feature_columns)?;

        let mut entries = Vec::with_capacity(table.len());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let cells: Vec<&str> = mapping.iter().map(|&col| row[col].as_str()).collect();
            let record = WorkloadRecord::from_cells(&cells).map_err(|err| match err {
                AppError::MissingAttribute { attribute, reason } => AppError::MissingAttribute {
                    attribute,
                    reason: format!("row {}: {}", row_idx + 1, reason),
                },
                other => other,
            })?;
            entries.push(LabeledRecord::new(record));
        }

        info!(
            rows = entries.len(),
            resolution = ?resolution,
            "Preprocessed workload dataset"
        );

        Ok(LabeledDataset::new(entries, resolution))
    }

    /// Map each attribute (canonical order) to a source column index.
    ///
    /// Positional renaming applies only when no header names an attribute;
    /// a partial or duplicated match is a schema mismatch.
    fn resolve_columns(
        &self,
        table: &RawTable,
        feature_columns: &[usize],
    ) -> Result<(Vec<usize>, SchemaResolution)> {
        let mut by_name: [Option<usize>; ATTRIBUTE_COUNT] = [None; ATTRIBUTE_COUNT];
        let mut unmatched = Vec::new();

        for &col in feature_columns {
            let header = &table.headers[col];
            match Attribute::from_column(header) {
                Some(attr) => {
                    if let Some(previous) = by_name[attr.position()] {
                        return Err(AppError::SchemaMismatch {
                            expected: ATTRIBUTE_COUNT,
                            found: feature_columns.len(),
                            detail: format!(
                                "columns '{}' and '{}' both name {}",
                                table.headers[previous],
                                header,
                                attr.column_name()
                            ),
                        });
                    }
                    by_name[attr.position()] = Some(col);
                }
                None => unmatched.push(header.clone()),
            }
        }

        if unmatched.is_empty() {
            let mapping: Vec<usize> = by_name.iter().flatten().copied().collect();
            let resolution = if mapping.as_slice() == feature_columns {
                SchemaResolution::Exact
            } else {
                info!("Dataset columns matched by name in non-canonical order; reordering");
                SchemaResolution::Reordered
            };
            return Ok((mapping, resolution));
        }

        let matched = feature_columns.len() - unmatched.len();
        if matched > 0 {
            let missing: Vec<&str> = Attribute::ALL
                .iter()
                .filter(|attr| by_name[attr.position()].is_none())
                .map(|attr| attr.column_name())
                .collect();
            return Err(AppError::SchemaMismatch {
                expected: ATTRIBUTE_COUNT,
                found: matched,
                detail: format!(
                    "unrecognized columns {:?}; missing attributes {:?}",
                    unmatched, missing
                ),
            });
        }

        warn!(
            headers = ?unmatched,
            "Dataset columns do not match the workload schema by name; renaming by position. \
             Verify the column order, a misaligned file silently corrupts every score"
        );

        Ok((
            feature_columns.to_vec(),
            SchemaResolution::Positional {
                original_headers: unmatched,
            },
        ))
    }
}
