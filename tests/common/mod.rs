//! Shared fixtures for integration tests

#![allow(dead_code)]

use faculty_stress_detector::dataset::{LabeledDataset, Preprocessor, RawTable};
use faculty_stress_detector::WorkloadRecord;
use std::io::Write;
use tempfile::NamedTempFile;

pub const CANONICAL_HEADERS: [&str; 9] = [
    "subjects_handled",
    "total_students",
    "preparation_hours",
    "research_load",
    "committee_duties",
    "administrative_tasks",
    "meeting_hours",
    "sleep_hours",
    "weekend_work_frequency",
];

/// Workload from the downstream hand-off example (WSS 19, Medium)
pub fn reference_record() -> WorkloadRecord {
    WorkloadRecord::from_values([4, 110, 9, 5, 2, 3, 6, 6, 2])
}

pub fn lightest_record() -> WorkloadRecord {
    WorkloadRecord::from_values([1, 30, 3, 1, 0, 0, 1, 8, 0])
}

pub fn heaviest_record() -> WorkloadRecord {
    WorkloadRecord::from_values([6, 150, 12, 8, 4, 5, 8, 4, 5])
}

/// Three well-separated workload profiles with some spread within each
pub fn clustered_records(n_low: u32, n_medium: u32, n_high: u32) -> Vec<WorkloadRecord> {
    let mut records = Vec::new();
    for i in 0..n_low {
        records.push(WorkloadRecord::from_values([
            1 + i % 2,
            25 + i % 30,
            2 + i % 3,
            1 + i % 3,
            i % 2,
            i % 2,
            1 + i % 2,
            7 + i % 2,
            0,
        ]));
    }
    for i in 0..n_medium {
        records.push(WorkloadRecord::from_values([
            3 + i % 2,
            65 + i % 30,
            6 + i % 4,
            4 + i % 3,
            2,
            2 + i % 2,
            3 + i % 3,
            6,
            1 + i % 2,
        ]));
    }
    for i in 0..n_high {
        records.push(WorkloadRecord::from_values([
            5 + i % 3,
            120 + i % 40,
            11 + i % 4,
            7 + i % 3,
            3 + i % 2,
            4 + i % 2,
            7 + i % 3,
            3 + i % 3,
            3 + i % 3,
        ]));
    }
    records
}

pub fn clustered_dataset(n_low: u32, n_medium: u32, n_high: u32) -> LabeledDataset {
    LabeledDataset::from_records(clustered_records(n_low, n_medium, n_high))
}

/// Raw table with a `Faculty_ID` column ahead of the canonical headers
pub fn raw_table_with_ids(records: &[WorkloadRecord]) -> RawTable {
    let mut headers = vec!["Faculty_ID".to_string()];
    headers.extend(CANONICAL_HEADERS.iter().map(|h| h.to_string()));

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut row = vec![format!("F{:03}", i + 1)];
            row.extend(r.values().iter().map(|v| v.to_string()));
            row
        })
        .collect();

    RawTable::new(headers, rows)
}

pub fn preprocess(table: &RawTable) -> LabeledDataset {
    Preprocessor::default().preprocess(table).unwrap()
}

/// Write records as a CSV file with an identifier column
pub fn write_dataset_csv(records: &[WorkloadRecord]) -> NamedTempFile {
    let table = raw_table_with_ids(records);
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", table.headers.join(",")).unwrap();
    for row in &table.rows {
        writeln!(file, "{}", row.join(",")).unwrap();
    }
    file.flush().unwrap();
    file
}
