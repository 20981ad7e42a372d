use crate::dataset::LabeledDataset;
use crate::error::{AppError, Result};
use crate::ml::classifier::{BaggedTreeTrainer, Classifier, Trainer};
use crate::ml::metrics::EvaluationMetrics;
use crate::ml::models::TrainingConfig;
use crate::ml::split::{PipelineWarning, SplitPolicy, TrainTestSplit};
use tracing::{debug, info, warn};

/// Result of one training run
#[derive(Debug)]
pub struct TrainingOutcome<M> {
    pub classifier: M,
    pub split: TrainTestSplit,
    pub warnings: Vec<PipelineWarning>,
}

/// Splits, fits and evaluates classifiers over labeled datasets
pub struct TrainingPipeline<T: Trainer = BaggedTreeTrainer> {
    trainer: T,
    policy: SplitPolicy,
    latest_split: Option<TrainTestSplit>,
}

impl TrainingPipeline<BaggedTreeTrainer> {
    /// Pipeline backed by the bagged tree ensemble
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(
            BaggedTreeTrainer::new(config.forest.clone(), config.seed),
            config.split_policy(),
        )
    }
}

impl<T: Trainer> TrainingPipeline<T> {
    pub fn new(trainer: T, policy: SplitPolicy) -> Self {
        Self {
            trainer,
            policy,
            latest_split: None,
        }
    }

    pub fn policy(&self) -> &SplitPolicy {
        &self.policy
    }

    /// Split the dataset and fit a classifier on the training partition
    pub fn train(&mut self, dataset: &LabeledDataset) -> Result<TrainingOutcome<T::Model>> {
        info!(
            rows = dataset.len(),
            classes = dataset.class_counts().len(),
            "Training stress classifier"
        );

        let (split, warnings) = self.policy.split(dataset)?;
        debug!(
            train_classes = ?split.train.class_counts(),
            test_classes = ?split.test.class_counts(),
            "Training partition ready"
        );

        let classifier = self
            .trainer
            .fit(&split.train.features, &split.train.labels)?;

        info!(
            n_train = split.train.len(),
            n_test = split.test.len(),
            stratified = split.stratified,
            "✅ Classifier trained"
        );

        self.latest_split = Some(split.clone());

        Ok(TrainingOutcome {
            classifier,
            split,
            warnings,
        })
    }

    /// Evaluate a classifier on both partitions of a split
    pub fn evaluate<C: Classifier + ?Sized>(
        &self,
        split: &TrainTestSplit,
        classifier: &C,
    ) -> Result<EvaluationMetrics> {
        let train_pred = classifier.predict(&split.train.features)?;
        let test_pred = classifier.predict(&split.test.features)?;

        let metrics = EvaluationMetrics::compute(
            &split.train.labels,
            &train_pred,
            &split.test.labels,
            &test_pred,
        );

        info!(
            train_accuracy = metrics.train_accuracy,
            test_accuracy = metrics.test_accuracy,
            macro_f1 = metrics.macro_f1,
            "Evaluated classifier"
        );
        if metrics.overfit_gap() > 0.2 {
            warn!(
                gap = metrics.overfit_gap(),
                "Training accuracy far exceeds test accuracy"
            );
        }

        Ok(metrics)
    }

    /// Evaluate against a split re-derived from the dataset with this pipeline's policy
    pub fn evaluate_on<C: Classifier + ?Sized>(
        &self,
        dataset: &LabeledDataset,
        classifier: &C,
    ) -> Result<EvaluationMetrics> {
        let split = match self.latest_split_for(dataset) {
            Some(split) => split.clone(),
            None => {
                let (split, warnings) = self.policy.split(dataset)?;
                for warning in &warnings {
                    warn!(%warning, "Re-derived split");
                }
                split
            }
        };

        if split.train.is_empty() || split.test.is_empty() {
            return Err(AppError::InsufficientData(
                "split left an empty partition".to_string(),
            ));
        }

        self.evaluate(&split, classifier)
    }

    /// Split from the most recent training run
    pub fn latest_split(&self) -> Option<&TrainTestSplit> {
        self.latest_split.as_ref()
    }

    /// Most recent split, only if it was derived from this dataset
    pub fn latest_split_for(&self, dataset: &LabeledDataset) -> Option<&TrainTestSplit> {
        self.latest_split
            .as_ref()
            .filter(|split| !split.is_stale_for(dataset))
    }

    /// Attach the classifier's predictions to every row as learned labels
    pub fn annotate<C: Classifier + ?Sized>(
        &self,
        dataset: &mut LabeledDataset,
        classifier: &C,
    ) -> Result<()> {
        let predictions = classifier.predict(&dataset.feature_matrix())?;
        dataset.attach_learned_labels(predictions)?;
        if let Some(agreement) = dataset.learned_agreement() {
            info!(agreement, "Attached learned labels");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::ForestConfig;
    use crate::models::{StressCategory, WorkloadRecord};

    fn dataset(n_per_class: u32) -> LabeledDataset {
        let mut records = Vec::new();
        for i in 0..n_per_class {
            records.push(WorkloadRecord::from_values([1, 30 + i, 3, 1, 0, 0, 1, 8, 0]));
            records.push(WorkloadRecord::from_values([4, 70 + i, 9, 5, 2, 3, 5, 6, 2]));
            records.push(WorkloadRecord::from_values([6, 150 + i, 12, 8, 4, 5, 8, 4, 5]));
        }
        LabeledDataset::from_records(records)
    }

    fn pipeline() -> TrainingPipeline {
        let config = TrainingConfig {
            forest: ForestConfig {
                n_estimators: 12,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        };
        TrainingPipeline::from_config(&config)
    }

    #[test]
    fn test_train_and_evaluate() {
        let data = dataset(10);
        let mut pipeline = pipeline();

        let outcome = pipeline.train(&data).unwrap();
        assert!(outcome.warnings.is_empty());
        assert!(outcome.split.stratified);
        assert_eq!(pipeline.latest_split().unwrap().test.len(), outcome.split.test.len());

        let metrics = pipeline.evaluate(&outcome.split, &outcome.classifier).unwrap();
        assert_eq!(metrics.n_test, outcome.split.test.len());
        assert_eq!(metrics.confusion_matrix.sum(), metrics.n_test);
        assert_eq!(metrics.test_accuracy, 1.0);
    }

    #[test]
    fn test_evaluate_on_matches_original_split() {
        let data = dataset(8);
        let mut pipeline = pipeline();
        let outcome = pipeline.train(&data).unwrap();
        let direct = pipeline.evaluate(&outcome.split, &outcome.classifier).unwrap();

        let fresh = self::pipeline();
        assert!(fresh.latest_split().is_none());
        let rederived = fresh.evaluate_on(&data, &outcome.classifier).unwrap();

        assert_eq!(rederived.n_test, direct.n_test);
        assert_eq!(rederived.confusion_matrix, direct.confusion_matrix);
    }

    #[test]
    fn test_latest_split_for_ignores_other_datasets() {
        let data = dataset(6);
        let mut pipeline = pipeline();
        pipeline.train(&data).unwrap();

        assert!(pipeline.latest_split_for(&data).is_some());
        assert!(pipeline.latest_split_for(&dataset(7)).is_none());
    }

    #[test]
    fn test_annotate() {
        let mut data = dataset(5);
        let mut pipeline = pipeline();
        let outcome = pipeline.train(&data).unwrap();

        pipeline.annotate(&mut data, &outcome.classifier).unwrap();
        let learned = data.learned_labels().unwrap();
        assert_eq!(learned.len(), data.len());
        assert!(learned.contains(&StressCategory::High));
    }

    #[test]
    fn test_train_rejects_single_row() {
        let data = LabeledDataset::from_records(vec![WorkloadRecord::from_values([
            1, 30, 3, 1, 0, 0, 1, 8, 0,
        ])]);
        let result = pipeline().train(&data);
        assert!(matches!(result, Err(AppError::InsufficientData(_))));
    }
}
