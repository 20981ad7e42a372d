/// Unified stress prediction
///
/// The rule-based score is always computed and is authoritative. An attached
/// classifier contributes a learned category for comparison only.

pub mod output;

pub use output::{stress_level_line, write_stress_output, STRESS_LEVEL_KEY};

use crate::error::{AppError, Result};
use crate::ml::{Classifier, Prediction};
use crate::models::{StressCategory, WorkloadRecord, Wss};
use crate::scoring;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionResult {
    /// No classifier was available
    RuleOnly {
        wss: Wss,
        rule_category: StressCategory,
    },

    /// Rule result with the classifier's opinion alongside
    RuleAndLearned {
        wss: Wss,
        rule_category: StressCategory,
        learned: Prediction<StressCategory>,
    },
}

impl PredictionResult {
    pub fn wss(&self) -> Wss {
        match self {
            PredictionResult::RuleOnly { wss, .. }
            | PredictionResult::RuleAndLearned { wss, .. } => *wss,
        }
    }

    /// Authoritative category
    pub fn rule_category(&self) -> StressCategory {
        match self {
            PredictionResult::RuleOnly { rule_category, .. }
            | PredictionResult::RuleAndLearned { rule_category, .. } => *rule_category,
        }
    }

    pub fn learned(&self) -> Option<&Prediction<StressCategory>> {
        match self {
            PredictionResult::RuleOnly { .. } => None,
            PredictionResult::RuleAndLearned { learned, .. } => Some(learned),
        }
    }

    pub fn learned_category(&self) -> Option<StressCategory> {
        self.learned().map(|p| p.value)
    }

    /// Whether the classifier agrees with the rule; `None` without a classifier
    pub fn agrees(&self) -> Option<bool> {
        self.learned_category().map(|c| c == self.rule_category())
    }
}

/// Explicit prediction context holding an optional shared classifier
#[derive(Clone, Default)]
pub struct PredictionContext {
    classifier: Option<Arc<dyn Classifier>>,
}

impl PredictionContext {
    /// Context without a classifier
    pub fn rule_only() -> Self {
        Self { classifier: None }
    }

    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.classifier.as_ref()
    }

    /// Classifier for operations that cannot proceed without one
    pub fn require_classifier(&self) -> Result<&Arc<dyn Classifier>> {
        self.classifier.as_ref().ok_or_else(|| {
            AppError::ClassifierUnavailable("no fitted classifier is attached".to_string())
        })
    }

    /// Predict a validated record; never fails
    pub fn predict(&self, record: &WorkloadRecord) -> PredictionResult {
        let (wss, rule_category) = scoring::evaluate(record);

        let Some(classifier) = &self.classifier else {
            return PredictionResult::RuleOnly { wss, rule_category };
        };

        match classifier.predict_one(&record.to_features()) {
            Ok(learned) => {
                debug!(
                    %wss,
                    rule = %rule_category,
                    learned = %learned.value,
                    confidence = learned.confidence,
                    "Predicted stress level"
                );
                PredictionResult::RuleAndLearned {
                    wss,
                    rule_category,
                    learned,
                }
            }
            Err(e) => {
                warn!(error = %e, "Classifier failed, falling back to rule-only result");
                PredictionResult::RuleOnly { wss, rule_category }
            }
        }
    }

    /// Predict from unparsed cells in canonical attribute order
    pub fn predict_cells<S: AsRef<str>>(&self, cells: &[S]) -> Result<PredictionResult> {
        let record = WorkloadRecord::from_cells(cells)?;
        Ok(self.predict(&record))
    }

    /// Predict from a map keyed by attribute name or alias
    pub fn predict_named<K: AsRef<str>, V: AsRef<str>>(
        &self,
        fields: &HashMap<K, V>,
    ) -> Result<PredictionResult> {
        let record = WorkloadRecord::from_named(fields)?;
        Ok(self.predict(&record))
    }

    /// Predict many records in parallel, preserving order
    pub fn predict_batch(&self, records: &[WorkloadRecord]) -> Vec<PredictionResult> {
        records.par_iter().map(|r| self.predict(r)).collect()
    }
}

impl std::fmt::Debug for PredictionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionContext")
            .field(
                "classifier",
                &self.classifier.as_ref().map(|c| c.metadata().name.clone()),
            )
            .finish()
    }
}
