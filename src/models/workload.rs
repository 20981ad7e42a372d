use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Number of workload attributes in the schema
pub const ATTRIBUTE_COUNT: usize = 9;

/// One of the nine workload indicators, in canonical column order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    SubjectsHandled,
    TotalStudents,
    PreparationHours,
    ResearchLoad,
    CommitteeDuties,
    AdministrativeTasks,
    MeetingHours,
    SleepHours,
    WeekendWorkFrequency,
}

impl Attribute {
    /// All attributes in canonical column order
    pub const ALL: [Attribute; ATTRIBUTE_COUNT] = [
        Attribute::SubjectsHandled,
        Attribute::TotalStudents,
        Attribute::PreparationHours,
        Attribute::ResearchLoad,
        Attribute::CommitteeDuties,
        Attribute::AdministrativeTasks,
        Attribute::MeetingHours,
        Attribute::SleepHours,
        Attribute::WeekendWorkFrequency,
    ];

    /// Canonical column name
    pub fn column_name(&self) -> &'static str {
        self.into()
    }

    /// Position in the canonical schema
    pub fn position(&self) -> usize {
        *self as usize
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::SubjectsHandled => "Subjects handled",
            Attribute::TotalStudents => "Total students",
            Attribute::PreparationHours => "Preparation hours per week",
            Attribute::ResearchLoad => "Research load (hours per week)",
            Attribute::CommitteeDuties => "Committee duties",
            Attribute::AdministrativeTasks => "Administrative tasks",
            Attribute::MeetingHours => "Meeting hours per week",
            Attribute::SleepHours => "Sleep hours per night",
            Attribute::WeekendWorkFrequency => "Weekend work (times per month)",
        }
    }

    /// Alternative column names accepted on input
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Attribute::SubjectsHandled => &["subjects"],
            Attribute::TotalStudents => &["students_total", "students"],
            Attribute::PreparationHours => &["prep_hours"],
            Attribute::ResearchLoad => &["research_load_hours", "research_hours"],
            Attribute::CommitteeDuties => &["committee"],
            Attribute::AdministrativeTasks => &["admin_tasks"],
            Attribute::MeetingHours => &["meetings"],
            Attribute::SleepHours => &["sleep"],
            Attribute::WeekendWorkFrequency => &["weekend_work", "weekend"],
        }
    }

    /// Resolve a column header by canonical name or alias.
    ///
    /// Matching ignores case, surrounding whitespace, and treats spaces and
    /// hyphens as underscores.
    pub fn from_column(header: &str) -> Option<Attribute> {
        let normalized = normalize_header(header);
        Attribute::ALL.into_iter().find(|attr| {
            attr.column_name() == normalized || attr.aliases().contains(&normalized.as_str())
        })
    }
}

/// Normalize a column header for comparison
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

/// A faculty member's workload sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadRecord {
    pub subjects_handled: u32,
    pub total_students: u32,
    pub preparation_hours: u32,
    pub research_load: u32,
    pub committee_duties: u32,
    pub administrative_tasks: u32,
    pub meeting_hours: u32,
    pub sleep_hours: u32,
    pub weekend_work_frequency: u32,
}

impl WorkloadRecord {
    /// Build a record from values in canonical order
    pub fn from_values(values: [u32; ATTRIBUTE_COUNT]) -> Self {
        Self {
            subjects_handled: values[0],
            total_students: values[1],
            preparation_hours: values[2],
            research_load: values[3],
            committee_duties: values[4],
            administrative_tasks: values[5],
            meeting_hours: values[6],
            sleep_hours: values[7],
            weekend_work_frequency: values[8],
        }
    }

    /// Parse a record from unparsed cells in canonical order
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Result<Self> {
        if cells.len() < ATTRIBUTE_COUNT {
            let missing = Attribute::ALL[cells.len()];
            return Err(AppError::missing_attribute(
                missing.column_name(),
                format!("expected {} values, got {}", ATTRIBUTE_COUNT, cells.len()),
            ));
        }
        if cells.len() > ATTRIBUTE_COUNT {
            return Err(AppError::Validation(format!(
                "expected {} values, got {}",
                ATTRIBUTE_COUNT,
                cells.len()
            )));
        }

        let mut values = [0u32; ATTRIBUTE_COUNT];
        for (attr, cell) in Attribute::ALL.iter().zip(cells) {
            values[attr.position()] = parse_cell(*attr, Some(cell.as_ref()))?;
        }
        Ok(Self::from_values(values))
    }

    /// Parse a record from a map keyed by canonical column name or alias
    pub fn from_named<K: AsRef<str>, V: AsRef<str>>(fields: &HashMap<K, V>) -> Result<Self> {
        let mut resolved: HashMap<Attribute, &str> = HashMap::new();
        for (key, value) in fields {
            if let Some(attr) = Attribute::from_column(key.as_ref()) {
                if resolved.insert(attr, value.as_ref()).is_some() {
                    return Err(AppError::missing_attribute(
                        attr.column_name(),
                        "given twice under different names",
                    ));
                }
            }
        }

        let mut values = [0u32; ATTRIBUTE_COUNT];
        for attr in Attribute::ALL {
            values[attr.position()] = parse_cell(attr, resolved.get(&attr).copied())?;
        }
        Ok(Self::from_values(values))
    }

    /// Value of a single attribute
    pub fn get(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::SubjectsHandled => self.subjects_handled,
            Attribute::TotalStudents => self.total_students,
            Attribute::PreparationHours => self.preparation_hours,
            Attribute::ResearchLoad => self.research_load,
            Attribute::CommitteeDuties => self.committee_duties,
            Attribute::AdministrativeTasks => self.administrative_tasks,
            Attribute::MeetingHours => self.meeting_hours,
            Attribute::SleepHours => self.sleep_hours,
            Attribute::WeekendWorkFrequency => self.weekend_work_frequency,
        }
    }

    /// Values in canonical order
    pub fn values(&self) -> [u32; ATTRIBUTE_COUNT] {
        Attribute::ALL.map(|attr| self.get(attr))
    }

    /// Feature vector for classifiers
    pub fn to_features(&self) -> Vec<f64> {
        self.values().iter().map(|&v| v as f64).collect()
    }
}

fn parse_cell(attribute: Attribute, cell: Option<&str>) -> Result<u32> {
    let name = attribute.column_name();
    let raw = match cell.map(str::trim) {
        None => return Err(AppError::missing_attribute(name, "not provided")),
        Some("") => return Err(AppError::missing_attribute(name, "empty value")),
        Some(raw) => raw,
    };

    let value: f64 = raw
        .parse()
        .map_err(|_| AppError::missing_attribute(name, format!("'{}' is not numeric", raw)))?;

    if !value.is_finite() {
        return Err(AppError::missing_attribute(name, format!("'{}' is not finite", raw)));
    }
    if value < 0.0 {
        return Err(AppError::missing_attribute(name, format!("'{}' is negative", raw)));
    }
    if value.fract() != 0.0 {
        return Err(AppError::missing_attribute(
            name,
            format!("'{}' is not a whole number", raw),
        ));
    }
    if value > u32::MAX as f64 {
        return Err(AppError::missing_attribute(name, format!("'{}' is out of range", raw)));
    }

    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_column_names() {
        assert_eq!(Attribute::SubjectsHandled.column_name(), "subjects_handled");
        assert_eq!(
            Attribute::WeekendWorkFrequency.column_name(),
            "weekend_work_frequency"
        );
        assert_eq!(Attribute::SleepHours.to_string(), "sleep_hours");
    }

    #[test]
    fn test_attribute_positions_follow_canonical_order() {
        for (idx, attr) in Attribute::ALL.iter().enumerate() {
            assert_eq!(attr.position(), idx);
        }
    }

    #[test]
    fn test_from_column_accepts_aliases() {
        assert_eq!(
            Attribute::from_column("students_total"),
            Some(Attribute::TotalStudents)
        );
        assert_eq!(
            Attribute::from_column(" Prep Hours "),
            Some(Attribute::PreparationHours)
        );
        assert_eq!(
            Attribute::from_column("Weekend-Work"),
            Some(Attribute::WeekendWorkFrequency)
        );
        assert_eq!(Attribute::from_column("Faculty_ID"), None);
    }

    #[test]
    fn test_from_cells() {
        let record =
            WorkloadRecord::from_cells(&["4", "110", "9", "5", "2", "3", "6", "6", "2"]).unwrap();
        assert_eq!(record.subjects_handled, 4);
        assert_eq!(record.total_students, 110);
        assert_eq!(record.weekend_work_frequency, 2);
        assert_eq!(record.values(), [4, 110, 9, 5, 2, 3, 6, 6, 2]);
    }

    #[test]
    fn test_from_cells_accepts_integral_floats() {
        let record =
            WorkloadRecord::from_cells(&["4.0", "110", "9", "5", "2", "3", "6", "6.0", "2"])
                .unwrap();
        assert_eq!(record.subjects_handled, 4);
        assert_eq!(record.sleep_hours, 6);
    }

    #[test]
    fn test_from_cells_rejects_bad_values() {
        let cases = [
            (["", "110", "9", "5", "2", "3", "6", "6", "2"], "subjects_handled"),
            (["4", "many", "9", "5", "2", "3", "6", "6", "2"], "total_students"),
            (["4", "110", "-1", "5", "2", "3", "6", "6", "2"], "preparation_hours"),
            (["4", "110", "9", "5", "2", "3", "6", "6.5", "2"], "sleep_hours"),
            (["4", "110", "9", "5", "2", "3", "NaN", "6", "2"], "meeting_hours"),
        ];

        for (cells, expected) in cases {
            match WorkloadRecord::from_cells(&cells) {
                Err(AppError::MissingAttribute { attribute, .. }) => {
                    assert_eq!(attribute, expected)
                }
                other => panic!("expected MissingAttribute for {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_from_cells_short_row() {
        let err = WorkloadRecord::from_cells(&["4", "110", "9"]).unwrap_err();
        match err {
            AppError::MissingAttribute { attribute, .. } => {
                assert_eq!(attribute, "research_load")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_named_with_aliases() {
        let fields: HashMap<&str, &str> = [
            ("subjects_handled", "4"),
            ("students_total", "110"),
            ("prep_hours", "9"),
            ("research_load_hours", "5"),
            ("committee_duties", "2"),
            ("admin_tasks", "3"),
            ("meeting_hours", "6"),
            ("sleep_hours", "6"),
            ("weekend_work", "2"),
        ]
        .into_iter()
        .collect();

        let record = WorkloadRecord::from_named(&fields).unwrap();
        assert_eq!(record.values(), [4, 110, 9, 5, 2, 3, 6, 6, 2]);
    }

    #[test]
    fn test_from_named_missing_field() {
        let fields: HashMap<&str, &str> = [("subjects_handled", "4")].into_iter().collect();
        let err = WorkloadRecord::from_named(&fields).unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingAttribute { ref attribute, .. } if attribute == "total_students"
        ));
    }

    #[test]
    fn test_from_named_rejects_conflicting_aliases() {
        let fields: HashMap<&str, &str> = [
            ("subjects_handled", "4"),
            ("total_students", "30"),
            ("students", "150"),
            ("preparation_hours", "9"),
            ("research_load", "5"),
            ("committee_duties", "2"),
            ("administrative_tasks", "3"),
            ("meeting_hours", "6"),
            ("sleep_hours", "6"),
            ("weekend_work_frequency", "2"),
        ]
        .into_iter()
        .collect();

        for _ in 0..20 {
            match WorkloadRecord::from_named(&fields) {
                Err(AppError::MissingAttribute { attribute, reason }) => {
                    assert_eq!(attribute, "total_students");
                    assert!(reason.contains("twice"));
                }
                other => panic!("expected MissingAttribute, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_to_features() {
        let record = WorkloadRecord::from_values([1, 30, 3, 1, 0, 0, 1, 8, 0]);
        assert_eq!(
            record.to_features(),
            vec![1.0, 30.0, 3.0, 1.0, 0.0, 0.0, 1.0, 8.0, 0.0]
        );
    }
}
