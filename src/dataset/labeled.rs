use crate::dataset::table::RawTable;
use crate::error::{AppError, Result};
use crate::models::{Attribute, StressCategory, WorkloadRecord, Wss, ATTRIBUTE_COUNT};
use crate::scoring;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// How dataset columns were matched to the attribute schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaResolution {
    /// Headers matched the canonical schema in canonical order
    Exact,

    /// Headers matched by name or alias but in a different order
    Reordered,

    /// Headers did not match; columns were renamed by position
    Positional { original_headers: Vec<String> },
}

/// A scored workload record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub record: WorkloadRecord,
    pub wss: Wss,
    pub category: StressCategory,
}

impl LabeledRecord {
    pub fn new(record: WorkloadRecord) -> Self {
        let (wss, category) = scoring::evaluate(&record);
        Self {
            record,
            wss,
            category,
        }
    }
}

/// Preprocessed dataset with derived WSS and category columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledDataset {
    entries: Vec<LabeledRecord>,
    resolution: SchemaResolution,
    learned: Option<Vec<StressCategory>>,
}

impl LabeledDataset {
    pub(crate) fn new(entries: Vec<LabeledRecord>, resolution: SchemaResolution) -> Self {
        Self {
            entries,
            resolution,
            learned: None,
        }
    }

    /// Score in-memory records directly
    pub fn from_records<I: IntoIterator<Item = WorkloadRecord>>(records: I) -> Self {
        let entries = records.into_iter().map(LabeledRecord::new).collect();
        Self::new(entries, SchemaResolution::Exact)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LabeledRecord] {
        &self.entries
    }

    pub fn resolution(&self) -> &SchemaResolution {
        &self.resolution
    }

    pub fn records(&self) -> impl Iterator<Item = &WorkloadRecord> + '_ {
        self.entries.iter().map(|e| &e.record)
    }

    /// Rule-based category column
    pub fn labels(&self) -> Vec<StressCategory> {
        self.entries.iter().map(|e| e.category).collect()
    }

    /// Feature matrix (n_samples × 9) in canonical attribute order
    pub fn feature_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.entries.len(), ATTRIBUTE_COUNT), |(i, j)| {
            self.entries[i].record.get(Attribute::ALL[j]) as f64
        })
    }

    /// Count of rows per observed category
    pub fn class_counts(&self) -> BTreeMap<StressCategory, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.category).or_insert(0) += 1;
        }
        counts
    }

    /// Content hash of the records, used to detect stale splits
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.entries.len() as u64).to_le_bytes());
        for entry in &self.entries {
            for value in entry.record.values() {
                hasher.update(value.to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// Learned-label column, present once a classifier has annotated the dataset
    pub fn learned_labels(&self) -> Option<&[StressCategory]> {
        self.learned.as_deref()
    }

    pub fn attach_learned_labels(&mut self, labels: Vec<StressCategory>) -> Result<()> {
        if labels.len() != self.entries.len() {
            return Err(AppError::Validation(format!(
                "learned label column has {} rows, dataset has {}",
                labels.len(),
                self.entries.len()
            )));
        }
        self.learned = Some(labels);
        Ok(())
    }

    /// Share of rows where the learned label matches the rule label
    pub fn learned_agreement(&self) -> Option<f64> {
        let learned = self.learned.as_ref()?;
        if learned.is_empty() {
            return None;
        }
        let agree = learned
            .iter()
            .zip(&self.entries)
            .filter(|(l, e)| **l == e.category)
            .count();
        Some(agree as f64 / learned.len() as f64)
    }

    /// Feature columns only, with canonical headers
    pub fn to_raw_table(&self) -> RawTable {
        let headers = Attribute::ALL
            .iter()
            .map(|a| a.column_name().to_string())
            .collect();
        let rows = self
            .entries
            .iter()
            .map(|e| e.record.values().iter().map(|v| v.to_string()).collect())
            .collect();
        RawTable::new(headers, rows)
    }
}
