/// Rule-based Workload Stress Score (WSS) engine
///
/// Every workload attribute is banded into 1, 2 or 3 points. The nine points
/// are summed into a WSS in [9, 27], which maps onto a [`StressCategory`]:
/// - Low: WSS ≤ 14
/// - Medium: 15 ≤ WSS ≤ 20
/// - High: WSS ≥ 21
///
/// These functions are the ground truth the classifier learns to approximate.
use crate::models::{
    Attribute, ScoreBreakdown, StressCategory, WorkloadRecord, Wss, ATTRIBUTE_COUNT,
};

/// Highest WSS still classified as Low
pub const LOW_MAX: u8 = 14;

/// Highest WSS still classified as Medium
pub const MEDIUM_MAX: u8 = 20;

/// Points contributed by one attribute value
pub fn band_points(attribute: Attribute, value: u32) -> u8 {
    match attribute {
        Attribute::SubjectsHandled => match value {
            0..=2 => 1,
            3..=4 => 2,
            _ => 3,
        },
        Attribute::TotalStudents => match value {
            0..=59 => 1,
            60..=100 => 2,
            _ => 3,
        },
        Attribute::PreparationHours => match value {
            0..=5 => 1,
            6..=10 => 2,
            _ => 3,
        },
        Attribute::ResearchLoad => match value {
            0..=3 => 1,
            4..=6 => 2,
            _ => 3,
        },
        Attribute::CommitteeDuties => match value {
            0..=1 => 1,
            2 => 2,
            _ => 3,
        },
        Attribute::AdministrativeTasks => match value {
            0..=1 => 1,
            2..=3 => 2,
            _ => 3,
        },
        Attribute::MeetingHours => match value {
            0..=2 => 1,
            3..=6 => 2,
            _ => 3,
        },
        // less sleep means more stress
        Attribute::SleepHours => match value {
            0..=5 => 3,
            6 => 2,
            _ => 1,
        },
        Attribute::WeekendWorkFrequency => match value {
            0 => 1,
            1..=2 => 2,
            _ => 3,
        },
    }
}

/// Per-attribute points for a record
pub fn breakdown(record: &WorkloadRecord) -> ScoreBreakdown {
    let mut points = [0u8; ATTRIBUTE_COUNT];
    for attribute in Attribute::ALL {
        points[attribute.position()] = band_points(attribute, record.get(attribute));
    }
    ScoreBreakdown::new(points)
}

/// Workload Stress Score of a record
pub fn score(record: &WorkloadRecord) -> Wss {
    breakdown(record).total()
}

/// Stress category for a score
pub fn categorize(wss: Wss) -> StressCategory {
    match wss.value() {
        v if v <= LOW_MAX => StressCategory::Low,
        v if v <= MEDIUM_MAX => StressCategory::Medium,
        _ => StressCategory::High,
    }
}

/// Score and categorize in one step
pub fn evaluate(record: &WorkloadRecord) -> (Wss, StressCategory) {
    let wss = score(record);
    (wss, categorize(wss))
}
