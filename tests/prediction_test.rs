/// Integration tests for the prediction interface and downstream hand-off
///
/// These tests verify:
/// - Rule-only predictions without a classifier
/// - The `STRESS_LEVEL=` line is byte-exact
/// - Batch prediction over a loaded dataset
mod common;

use faculty_stress_detector::dataset::load_csv;
use faculty_stress_detector::error::AppError;
use faculty_stress_detector::ml::{FileModelStore, ModelStore};
use faculty_stress_detector::prediction::{
    stress_level_line, write_stress_output, PredictionContext, PredictionResult,
};
use faculty_stress_detector::{StressCategory, WorkloadRecord};
use std::collections::HashMap;

#[test]
fn test_end_to_end_reference_workload() {
    let context = PredictionContext::rule_only();
    let result = context
        .predict_cells(&["4", "110", "9", "5", "2", "3", "6", "6", "2"])
        .unwrap();

    assert!(matches!(result, PredictionResult::RuleOnly { .. }));
    assert_eq!(result.wss().value(), 19);
    assert_eq!(result.rule_category(), StressCategory::Medium);

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("stress_output.txt");
    write_stress_output(&path, result.rule_category()).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"STRESS_LEVEL=Medium\n");
}

#[test]
fn test_stress_level_line_has_no_padding() {
    for category in StressCategory::ALL {
        let line = stress_level_line(category);
        assert!(line.starts_with("STRESS_LEVEL="));
        assert!(!line.contains(' '));
        assert!(!line.ends_with('\n'));
        assert_eq!(line, format!("STRESS_LEVEL={}", category));
    }
}

#[test]
fn test_missing_attribute_is_reported() {
    let context = PredictionContext::rule_only();
    let fields: HashMap<String, String> = [("subjects_handled", "3"), ("total_students", "80")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let err = context.predict_named(&fields).unwrap_err();
    assert!(matches!(err, AppError::MissingAttribute { .. }));
    assert_eq!(err.error_code(), "MISSING_ATTRIBUTE");
}

#[test]
fn test_negative_value_is_rejected() {
    let context = PredictionContext::rule_only();
    let err = context
        .predict_cells(&["4", "110", "9", "5", "2", "3", "6", "-1", "2"])
        .unwrap_err();
    assert!(err.to_string().contains("sleep_hours"));
}

#[test]
fn test_absent_model_means_rule_only() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = FileModelStore::new(dir.path().join("missing.bin"));

    let context = match store.load().unwrap() {
        Some(classifier) => PredictionContext::with_classifier(std::sync::Arc::new(classifier)),
        None => PredictionContext::rule_only(),
    };
    assert!(!context.has_classifier());
    assert!(context.require_classifier().is_err());

    let result = context.predict(&common::heaviest_record());
    assert_eq!(result.rule_category(), StressCategory::High);
    assert!(result.learned().is_none());
}

#[test]
fn test_batch_over_loaded_dataset() {
    let records = common::clustered_records(4, 6, 3);
    let file = common::write_dataset_csv(&records);
    let dataset = common::preprocess(&load_csv(file.path(), true).unwrap());

    let loaded: Vec<WorkloadRecord> = dataset.records().copied().collect();
    let results = PredictionContext::rule_only().predict_batch(&loaded);

    assert_eq!(results.len(), records.len());
    for (result, entry) in results.iter().zip(dataset.entries()) {
        assert_eq!(result.wss(), entry.wss);
        assert_eq!(result.rule_category(), entry.category);
    }
}
