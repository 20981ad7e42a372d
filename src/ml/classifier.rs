use crate::error::{AppError, Result};
use crate::ml::models::{ForestConfig, ModelMetadata, Prediction};
use crate::models::StressCategory;
use ndarray::Array2;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Model format version written into metadata
pub const MODEL_VERSION: &str = "1.0";

const N_CLASSES: usize = StressCategory::ALL.len();

/// Trait for fitted classifiers
pub trait Classifier: Send + Sync {
    /// Predict class labels
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<StressCategory>>;

    /// Predict class probabilities (n_samples × 3, columns in category order)
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Predict a single feature vector with its confidence
    fn predict_one(&self, features: &[f64]) -> Result<Prediction<StressCategory>> {
        let features_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| AppError::Validation(format!("Failed to create feature array: {}", e)))?;

        let proba = self.predict_proba(&features_array)?;
        let row = proba.row(0);
        let best = argmax(row.iter().copied());
        let category = StressCategory::from_index(best)
            .ok_or_else(|| AppError::Training(format!("Unknown class index {}", best)))?;

        let probabilities: HashMap<String, f64> = StressCategory::ALL
            .iter()
            .map(|c| (c.to_string(), row[c.index()]))
            .collect();

        Ok(Prediction::new(category, row[best]).with_probabilities(probabilities))
    }
}

/// Trait for learning algorithms that produce a [`Classifier`]
pub trait Trainer: Send + Sync {
    type Model: Classifier;

    /// Fit a model on a feature matrix and its labels
    fn fit(&self, features: &Array2<f64>, labels: &[StressCategory]) -> Result<Self::Model>;
}

type Tree = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// One voter of the ensemble
#[derive(Serialize, Deserialize)]
enum MemberModel {
    Tree(Tree),
    /// Bag held a single class
    Constant(usize),
}

#[derive(Serialize, Deserialize)]
struct EnsembleMember {
    /// Feature columns this member was fitted on
    columns: Vec<usize>,
    model: MemberModel,
}

impl EnsembleMember {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let n_rows = features.nrows();
        match &self.model {
            MemberModel::Constant(class) => Ok(vec![*class; n_rows]),
            MemberModel::Tree(tree) => {
                let rows: Vec<usize> = (0..n_rows).collect();
                let x = to_densematrix(features, &rows, &self.columns);
                let predictions = tree
                    .predict(&x)
                    .map_err(|e| AppError::Training(format!("Prediction failed: {}", e)))?;
                Ok(predictions.iter().map(|&p| p as usize).collect())
            }
        }
    }
}

/// Bagged ensemble of decision trees with class-balanced bootstrap sampling
#[derive(Debug, Clone)]
pub struct BaggedTreeTrainer {
    config: ForestConfig,
    seed: u64,
}

impl BaggedTreeTrainer {
    pub fn new(config: ForestConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    fn tree_parameters(&self) -> DecisionTreeClassifierParameters {
        DecisionTreeClassifierParameters::default()
            .with_criterion(SplitCriterion::Gini)
            .with_max_depth(self.config.max_depth)
            .with_min_samples_leaf(self.config.min_samples_leaf)
            .with_min_samples_split(self.config.min_samples_split)
    }

    fn feature_columns(&self, n_features: usize, rng: &mut StdRng) -> Vec<usize> {
        match self.config.max_features {
            Some(k) if k < n_features => {
                let mut columns = rand::seq::index::sample(rng, n_features, k.max(1)).into_vec();
                columns.sort_unstable();
                columns
            }
            _ => (0..n_features).collect(),
        }
    }

    fn fit_member(
        &self,
        features: &Array2<f64>,
        labels: &[StressCategory],
        rows: &[usize],
        columns: Vec<usize>,
    ) -> Result<EnsembleMember> {
        let y: Vec<i32> = rows.iter().map(|&r| labels[r].index() as i32).collect();
        let distinct: BTreeSet<i32> = y.iter().copied().collect();

        let model = if distinct.len() < 2 {
            MemberModel::Constant(y.first().copied().unwrap_or(0) as usize)
        } else {
            let x = to_densematrix(features, rows, &columns);
            let tree = Tree::fit(&x, &y, self.tree_parameters()).map_err(|e| {
                AppError::Training(format!("Failed to train decision tree: {}", e))
            })?;
            MemberModel::Tree(tree)
        };

        Ok(EnsembleMember { columns, model })
    }
}

impl Trainer for BaggedTreeTrainer {
    type Model = FittedClassifier;

    fn fit(&self, features: &Array2<f64>, labels: &[StressCategory]) -> Result<FittedClassifier> {
        let n_samples = features.nrows();
        let n_features = features.ncols();

        if n_samples == 0 {
            return Err(AppError::InsufficientData(
                "No samples provided for training".to_string(),
            ));
        }
        if labels.len() != n_samples {
            return Err(AppError::Validation(format!(
                "{} labels for {} samples",
                labels.len(),
                n_samples
            )));
        }
        if self.config.n_estimators == 0 {
            return Err(AppError::Configuration(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        let class_weights = self.config.class_weighting.weights(labels);
        let sample_weights: Vec<f64> = labels.iter().map(|l| class_weights[l]).collect();
        let sampler = WeightedIndex::new(&sample_weights)
            .map_err(|e| AppError::Training(format!("Invalid sample weights: {}", e)))?;

        let members: Vec<EnsembleMember> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
                let rows: Vec<usize> = (0..n_samples).map(|_| sampler.sample(&mut rng)).collect();
                let columns = self.feature_columns(n_features, &mut rng);
                self.fit_member(features, labels, &rows, columns)
            })
            .collect::<Result<_>>()?;

        let mut class_distribution = BTreeMap::new();
        for label in labels {
            *class_distribution.entry(*label).or_insert(0) += 1;
        }

        debug!(
            n_estimators = members.len(),
            n_samples,
            n_features,
            "Fitted bagged tree ensemble"
        );

        Ok(FittedClassifier {
            metadata: ModelMetadata {
                name: "Bagged Decision Trees".to_string(),
                version: MODEL_VERSION.to_string(),
                trained_at: chrono::Utc::now(),
                n_training_samples: n_samples,
                n_features,
                class_distribution,
                class_weights,
                hyperparameters: self.config.hyperparameters(),
            },
            members,
            n_features,
        })
    }
}

/// Fitted ensemble; majority vote of its members, ties toward the lower category
#[derive(Serialize, Deserialize)]
pub struct FittedClassifier {
    metadata: ModelMetadata,
    members: Vec<EnsembleMember>,
    n_features: usize,
}

impl FittedClassifier {
    pub fn n_members(&self) -> usize {
        self.members.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn votes(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.n_features {
            return Err(AppError::Validation(format!(
                "expected {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }

        let mut votes = Array2::zeros((features.nrows(), N_CLASSES));
        if features.nrows() == 0 {
            return Ok(votes);
        }

        let member_predictions: Vec<Vec<usize>> = self
            .members
            .par_iter()
            .map(|m| m.predict(features))
            .collect::<Result<_>>()?;

        for predictions in member_predictions {
            for (row, class) in predictions.into_iter().enumerate() {
                if class < N_CLASSES {
                    votes[[row, class]] += 1.0;
                }
            }
        }

        Ok(votes)
    }
}

impl Classifier for FittedClassifier {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<StressCategory>> {
        let votes = self.votes(features)?;
        votes
            .rows()
            .into_iter()
            .map(|row| {
                let best = argmax(row.iter().copied());
                StressCategory::from_index(best)
                    .ok_or_else(|| AppError::Training(format!("Unknown class index {}", best)))
            })
            .collect()
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        let votes = self.votes(features)?;
        let total = self.members.len().max(1) as f64;
        Ok(votes / total)
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl std::fmt::Debug for FittedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FittedClassifier")
            .field("metadata", &self.metadata)
            .field("members", &self.members.len())
            .field("n_features", &self.n_features)
            .finish()
    }
}

/// Index of the largest value; earlier indices win ties
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (idx, value) in values.enumerate() {
        if value > best_value {
            best = idx;
            best_value = value;
        }
    }
    best
}

fn to_densematrix(features: &Array2<f64>, rows: &[usize], columns: &[usize]) -> DenseMatrix<f64> {
    let mut data = Vec::with_capacity(rows.len() * columns.len());
    for &r in rows {
        for &c in columns {
            data.push(features[[r, c]]);
        }
    }
    DenseMatrix::new(rows.len(), columns.len(), data, false)
}
