use crate::ml::split::SplitPolicy;
use crate::models::StressCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Seed shared by the split and the ensemble
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Lower bound of the held-out fraction
    #[serde(default = "default_min_test_fraction")]
    pub min_test_fraction: f64,

    /// Upper bound of the held-out fraction
    #[serde(default = "default_max_test_fraction")]
    pub max_test_fraction: f64,

    /// Ensemble hyperparameters
    #[serde(default)]
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            min_test_fraction: default_min_test_fraction(),
            max_test_fraction: default_max_test_fraction(),
            forest: ForestConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn split_policy(&self) -> SplitPolicy {
        SplitPolicy {
            seed: self.seed,
            min_test_fraction: self.min_test_fraction,
            max_test_fraction: self.max_test_fraction,
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_min_test_fraction() -> f64 {
    0.15
}

fn default_max_test_fraction() -> f64 {
    0.30
}

/// Bagged decision tree ensemble configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,

    /// Maximum tree depth
    pub max_depth: u16,

    /// Minimum samples per leaf
    pub min_samples_leaf: usize,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Features drawn per tree (all features when unset)
    #[serde(default)]
    pub max_features: Option<usize>,

    /// Class-imbalance compensation
    #[serde(default)]
    pub class_weighting: ClassWeighting,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 8,
            min_samples_leaf: 2,
            min_samples_split: 4,
            max_features: None,
            class_weighting: ClassWeighting::Balanced,
        }
    }
}

impl ForestConfig {
    pub fn hyperparameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("n_estimators".to_string(), self.n_estimators.to_string());
        params.insert("max_depth".to_string(), self.max_depth.to_string());
        params.insert(
            "min_samples_leaf".to_string(),
            self.min_samples_leaf.to_string(),
        );
        params.insert(
            "min_samples_split".to_string(),
            self.min_samples_split.to_string(),
        );
        params.insert(
            "max_features".to_string(),
            self.max_features
                .map(|m| m.to_string())
                .unwrap_or_else(|| "all".to_string()),
        );
        params.insert(
            "class_weighting".to_string(),
            format!("{:?}", self.class_weighting).to_lowercase(),
        );
        params
    }
}

/// Class weighting strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeighting {
    /// Inverse-frequency weights `n / (k * count_c)`
    #[default]
    Balanced,

    /// Every sample weighs the same
    Uniform,
}

impl ClassWeighting {
    /// Per-class weights for the given labels
    pub fn weights(&self, labels: &[StressCategory]) -> BTreeMap<StressCategory, f64> {
        let mut counts: BTreeMap<StressCategory, usize> = BTreeMap::new();
        for label in labels {
            *counts.entry(*label).or_insert(0) += 1;
        }

        let n = labels.len() as f64;
        let k = counts.len() as f64;
        counts
            .into_iter()
            .map(|(label, count)| {
                let weight = match self {
                    ClassWeighting::Balanced => n / (k * count as f64),
                    ClassWeighting::Uniform => 1.0,
                };
                (label, weight)
            })
            .collect()
    }
}

/// Prediction result with confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction<T> {
    /// Predicted value
    pub value: T,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,

    /// All class probabilities
    pub probabilities: HashMap<String, f64>,
}

impl<T> Prediction<T> {
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence,
            probabilities: HashMap::new(),
        }
    }

    pub fn with_probabilities(mut self, probabilities: HashMap<String, f64>) -> Self {
        self.probabilities = probabilities;
        self
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model version
    pub version: String,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Training rows per class
    pub class_distribution: BTreeMap<StressCategory, usize>,

    /// Class weights applied while bagging
    pub class_weights: BTreeMap<StressCategory, f64>,

    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
}
