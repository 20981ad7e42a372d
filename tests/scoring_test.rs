/// Integration tests for the rule-based scoring engine
///
/// These tests verify:
/// - Score range and sub-score composition over arbitrary workloads
/// - Monotonic categorization
/// - Category boundaries and the worked examples
mod common;

use faculty_stress_detector::models::{Attribute, StressCategory, WorkloadRecord, Wss};
use faculty_stress_detector::prediction::stress_level_line;
use faculty_stress_detector::scoring;
use proptest::prelude::*;

fn arb_record() -> impl Strategy<Value = WorkloadRecord> {
    prop::array::uniform9(0u32..400).prop_map(WorkloadRecord::from_values)
}

proptest! {
    #[test]
    fn score_is_sum_of_nine_subscores(record in arb_record()) {
        let breakdown = scoring::breakdown(&record);
        prop_assert!(breakdown.points().iter().all(|p| (1..=3).contains(p)));

        let sum: u32 = breakdown.points().iter().map(|&p| p as u32).sum();
        let wss = scoring::score(&record);
        prop_assert_eq!(sum, wss.value() as u32);
        prop_assert!((9..=27).contains(&wss.value()));
    }

    #[test]
    fn categorize_is_monotonic(a in 9u8..=27, b in 9u8..=27) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo = Wss::new(lo).unwrap();
        let hi = Wss::new(hi).unwrap();
        prop_assert!(scoring::categorize(lo) <= scoring::categorize(hi));
    }

    #[test]
    fn more_work_never_lowers_the_score(record in arb_record(), bump in 1u32..50) {
        // every attribute except sleep raises stress as it grows
        let mut values = record.values();
        for attr in Attribute::ALL {
            if attr != Attribute::SleepHours {
                values[attr.position()] += bump;
            }
        }
        let heavier = WorkloadRecord::from_values(values);
        prop_assert!(scoring::score(&heavier) >= scoring::score(&record));
    }
}

#[test]
fn test_category_boundaries() {
    let category = |v: u8| scoring::categorize(Wss::new(v).unwrap());

    assert_eq!(category(9), StressCategory::Low);
    assert_eq!(category(14), StressCategory::Low);
    assert_eq!(category(15), StressCategory::Medium);
    assert_eq!(category(20), StressCategory::Medium);
    assert_eq!(category(21), StressCategory::High);
    assert_eq!(category(27), StressCategory::High);
}

#[test]
fn test_reference_workload() {
    let record = common::reference_record();
    let breakdown = scoring::breakdown(&record);

    // 110 students sits above the 60-100 band
    assert_eq!(breakdown.points(), &[2, 3, 2, 2, 2, 2, 2, 2, 2]);
    assert_eq!(breakdown.points_for(Attribute::TotalStudents), 3);

    let (wss, category) = scoring::evaluate(&record);
    assert_eq!(wss.value(), 19);
    assert_eq!(category, StressCategory::Medium);
    assert_eq!(stress_level_line(category), "STRESS_LEVEL=Medium");
}

#[test]
fn test_reference_workload_within_student_band() {
    let mut values = common::reference_record().values();
    values[Attribute::TotalStudents.position()] = 100;
    let record = WorkloadRecord::from_values(values);

    assert_eq!(scoring::breakdown(&record).points(), &[2; 9]);
    assert_eq!(scoring::score(&record).value(), 18);
}

#[test]
fn test_extreme_workloads() {
    assert_eq!(
        scoring::evaluate(&common::lightest_record()),
        (Wss::new(9).unwrap(), StressCategory::Low)
    );
    assert_eq!(
        scoring::evaluate(&common::heaviest_record()),
        (Wss::new(27).unwrap(), StressCategory::High)
    );
}

#[test]
fn test_sleep_bands_are_inverted() {
    let points = |hours| scoring::band_points(Attribute::SleepHours, hours);
    assert_eq!(points(4), 3);
    assert_eq!(points(5), 3);
    assert_eq!(points(6), 2);
    assert_eq!(points(7), 1);
    assert_eq!(points(9), 1);
}
