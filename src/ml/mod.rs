/// Learned stress classification
///
/// This module provides the training side of the detector:
/// - Stratified train/test splitting with a degraded random fallback
/// - A class-balanced bagged decision tree ensemble behind the `Trainer` seam
/// - Evaluation metrics with confusion matrix and classification report
/// - Persistence of fitted classifiers

pub mod classifier;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod split;
pub mod store;

pub use classifier::{BaggedTreeTrainer, Classifier, FittedClassifier, Trainer};
pub use metrics::{ClassMetrics, EvaluationMetrics};
pub use models::{ClassWeighting, ForestConfig, ModelMetadata, Prediction, TrainingConfig};
pub use pipeline::{TrainingOutcome, TrainingPipeline};
pub use split::{Partition, PipelineWarning, SplitPolicy, TrainTestSplit};
pub use store::{FileModelStore, ModelStore};
