use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A workload attribute was absent, empty or not a non-negative integer
    #[error("Missing attribute '{attribute}': {reason}")]
    MissingAttribute { attribute: String, reason: String },

    /// Dataset columns cannot be reconciled with the nine-attribute schema
    #[error("Schema mismatch: expected {expected} columns, found {found} ({detail})")]
    SchemaMismatch {
        expected: usize,
        found: usize,
        detail: String,
    },

    /// No fitted classifier is available for an operation that requires one
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Not enough rows to partition or fit
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Classifier fitting or inference failures
    #[error("Training error: {0}")]
    Training(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Dataset source errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Build a `MissingAttribute` error
    pub fn missing_attribute(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::MissingAttribute {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::MissingAttribute { .. } => "MISSING_ATTRIBUTE",
            AppError::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            AppError::ClassifierUnavailable(_) => "CLASSIFIER_UNAVAILABLE",
            AppError::InsufficientData(_) => "INSUFFICIENT_DATA",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Dataset(_) => "DATASET_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the caller can recover by correcting a single input record
    pub fn is_record_level(&self) -> bool {
        matches!(self, AppError::MissingAttribute { .. })
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Dataset(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::missing_attribute("sleep_hours", "empty cell").error_code(),
            "MISSING_ATTRIBUTE"
        );
        assert_eq!(
            AppError::SchemaMismatch {
                expected: 9,
                found: 8,
                detail: "test".to_string()
            }
            .error_code(),
            "SCHEMA_MISMATCH"
        );
        assert_eq!(
            AppError::ClassifierUnavailable("test".to_string()).error_code(),
            "CLASSIFIER_UNAVAILABLE"
        );
    }

    #[test]
    fn test_record_level_errors() {
        assert!(AppError::missing_attribute("meeting_hours", "not numeric").is_record_level());
        assert!(!AppError::Training("boom".to_string()).is_record_level());
    }

    #[test]
    fn test_schema_mismatch_message() {
        let err = AppError::SchemaMismatch {
            expected: 9,
            found: 7,
            detail: "after dropping identifier columns".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Schema mismatch: expected 9 columns, found 7 (after dropping identifier columns)"
        );
    }
}
