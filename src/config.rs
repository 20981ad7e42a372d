use crate::dataset::Preprocessor;
use crate::ml::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dataset source configuration
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Split and ensemble configuration
    #[serde(default)]
    pub training: TrainingConfig,

    /// Model store configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Downstream output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("FACULTY_STRESS_CONFIG")
            .unwrap_or_else(|_| "config/local.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: FACULTY_STRESS_)
            .add_source(
                config::Environment::with_prefix("FACULTY_STRESS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// CSV dataset path
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,

    /// Whether the first row holds column names
    #[serde(default = "default_true")]
    pub has_headers: bool,

    /// Non-feature identifier columns dropped before schema matching
    #[serde(default = "default_identifier_columns")]
    pub identifier_columns: Vec<String>,

    /// Columns derived by scoring, dropped and recomputed on load
    #[serde(default = "default_derived_columns")]
    pub derived_columns: Vec<String>,
}

impl DatasetConfig {
    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(&self.identifier_columns, &self.derived_columns)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            has_headers: true,
            identifier_columns: default_identifier_columns(),
            derived_columns: default_derived_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Fitted classifier file
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File receiving the `STRESS_LEVEL=` line
    #[serde(default = "default_stress_output_path")]
    pub stress_output_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stress_output_path: default_stress_output_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

// Default value functions
fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/faculty_workload.csv")
}

fn default_identifier_columns() -> Vec<String> {
    vec!["Faculty_ID".to_string()]
}

fn default_derived_columns() -> Vec<String> {
    vec![
        "wss".to_string(),
        "stress_level".to_string(),
        "learned_stress_level".to_string(),
    ]
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/stress_classifier.bin")
}

fn default_stress_output_path() -> PathBuf {
    PathBuf::from("stress_output.txt")
}

fn default_log_filter() -> String {
    "faculty_stress_detector=info".to_string()
}

fn default_true() -> bool {
    true
}
