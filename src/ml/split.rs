use crate::dataset::LabeledDataset;
use crate::error::{AppError, Result};
use crate::models::{StressCategory, ATTRIBUTE_COUNT};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Non-fatal conditions surfaced by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Stratified splitting was infeasible; a plain random split was used
    StratificationDegraded { reason: String },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::StratificationDegraded { reason } => {
                write!(f, "stratification degraded: {}", reason)
            }
        }
    }
}

/// Train/test partitioning policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub seed: u64,
    pub min_test_fraction: f64,
    pub max_test_fraction: f64,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            seed: 42,
            min_test_fraction: 0.15,
            max_test_fraction: 0.30,
        }
    }
}

/// One side of a split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    /// Row indices into the source dataset
    pub indices: Vec<usize>,

    /// Feature matrix (rows × 9)
    pub features: Array2<f64>,

    /// Rule-based labels
    pub labels: Vec<StressCategory>,
}

impl Partition {
    fn select(features: &Array2<f64>, labels: &[StressCategory], indices: Vec<usize>) -> Self {
        Self {
            features: features.select(Axis(0), &indices),
            labels: indices.iter().map(|&i| labels[i]).collect(),
            indices,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn class_counts(&self) -> BTreeMap<StressCategory, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(*label).or_insert(0) += 1;
        }
        counts
    }
}

/// Train and held-out partitions of one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train: Partition,
    pub test: Partition,

    /// Fraction targeted for the test partition
    pub test_fraction: f64,

    /// Whether class proportions were preserved
    pub stratified: bool,

    pub seed: u64,

    dataset_fingerprint: String,
}

impl TrainTestSplit {
    pub fn dataset_fingerprint(&self) -> &str {
        &self.dataset_fingerprint
    }

    /// Whether the split was derived from different data
    pub fn is_stale_for(&self, dataset: &LabeledDataset) -> bool {
        self.dataset_fingerprint != dataset.fingerprint()
    }
}

impl SplitPolicy {
    fn validate(&self) -> Result<()> {
        let valid = self.min_test_fraction > 0.0
            && self.max_test_fraction < 1.0
            && self.min_test_fraction <= self.max_test_fraction;
        if !valid {
            return Err(AppError::Configuration(format!(
                "test fraction bounds [{}, {}] must satisfy 0 < min <= max < 1",
                self.min_test_fraction, self.max_test_fraction
            )));
        }
        Ok(())
    }

    /// Held-out fraction: rarest class share clamped into the policy bounds
    pub fn test_fraction(&self, counts: &BTreeMap<StressCategory, usize>, total: usize) -> f64 {
        let rarest = counts.values().copied().min().unwrap_or(0);
        let share = if total == 0 {
            0.0
        } else {
            rarest as f64 / total as f64
        };
        share.clamp(self.min_test_fraction, self.max_test_fraction)
    }

    /// Partition a dataset, stratified by category when feasible
    pub fn split(
        &self,
        dataset: &LabeledDataset,
    ) -> Result<(TrainTestSplit, Vec<PipelineWarning>)> {
        self.validate()?;

        let n = dataset.len();
        if n < 2 {
            return Err(AppError::InsufficientData(format!(
                "at least 2 rows are required to split, got {}",
                n
            )));
        }

        let labels = dataset.labels();
        let counts = dataset.class_counts();
        let test_fraction = self.test_fraction(&counts, n);
        // epsilon keeps exact products like 43 * (8/43) from rounding up a row
        let n_test = ((n as f64 * test_fraction - 1e-9).ceil() as usize).clamp(1, n - 1);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut warnings = Vec::new();

        let (train_idx, test_idx, stratified) =
            match stratification_blocker(&counts, n, n_test) {
                None => {
                    let (train, test) = stratified_indices(&labels, &counts, n_test, &mut rng);
                    (train, test, true)
                }
                Some(reason) => {
                    warn!(reason = %reason, "Stratified split infeasible, using random split");
                    warnings.push(PipelineWarning::StratificationDegraded { reason });
                    let (train, test) = random_indices(n, n_test, &mut rng);
                    (train, test, false)
                }
            };

        debug!(
            n_train = train_idx.len(),
            n_test = test_idx.len(),
            test_fraction,
            stratified,
            "Split dataset"
        );

        let features = dataset.feature_matrix();
        debug_assert_eq!(features.ncols(), ATTRIBUTE_COUNT);

        let split = TrainTestSplit {
            train: Partition::select(&features, &labels, train_idx),
            test: Partition::select(&features, &labels, test_idx),
            test_fraction,
            stratified,
            seed: self.seed,
            dataset_fingerprint: dataset.fingerprint(),
        };

        Ok((split, warnings))
    }
}

/// Reason stratification cannot place every class on both sides, if any
fn stratification_blocker(
    counts: &BTreeMap<StressCategory, usize>,
    n: usize,
    n_test: usize,
) -> Option<String> {
    if let Some((label, count)) = counts.iter().find(|(_, count)| **count < 2) {
        return Some(format!(
            "class {} has {} member(s), at least 2 are required",
            label, count
        ));
    }

    let k = counts.len();
    if n_test < k || n - n_test < k {
        return Some(format!(
            "partitions of {} and {} rows cannot each hold all {} classes",
            n - n_test,
            n_test,
            k
        ));
    }

    None
}

fn stratified_indices(
    labels: &[StressCategory],
    counts: &BTreeMap<StressCategory, usize>,
    n_test: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let n = labels.len();

    // largest-remainder allocation of the test rows across classes
    let mut allocation: Vec<(StressCategory, usize, f64)> = counts
        .iter()
        .map(|(&label, &count)| {
            let exact = count as f64 * n_test as f64 / n as f64;
            (label, exact.floor() as usize, exact - exact.floor())
        })
        .collect();

    let assigned: usize = allocation.iter().map(|(_, take, _)| take).sum();
    let mut order: Vec<usize> = (0..allocation.len()).collect();
    order.sort_by(|&a, &b| {
        allocation[b]
            .2
            .partial_cmp(&allocation[a].2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    for &slot in order.iter().take(n_test.saturating_sub(assigned)) {
        allocation[slot].1 += 1;
    }

    let mut train = Vec::with_capacity(n);
    let mut test = Vec::with_capacity(n_test);

    for (label, take, _) in allocation {
        let count = counts[&label];
        let take = take.clamp(1, count - 1);

        let mut members: Vec<usize> = (0..n).filter(|&i| labels[i] == label).collect();
        members.shuffle(rng);

        test.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

fn random_indices(n: usize, n_test: usize, rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut test = indices[..n_test].to_vec();
    let mut train = indices[n_test..].to_vec();
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
