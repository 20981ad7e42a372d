use crate::models::StressCategory;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Per-class evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: StressCategory,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Evaluation snapshot of one classifier over one split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,

    /// Sorted union of observed true and predicted test labels
    pub labels: Vec<StressCategory>,

    /// Per-class metrics, ordered like `labels`
    pub per_class: Vec<ClassMetrics>,

    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,

    /// Support-weighted mean of per-class F1
    pub weighted_f1: f64,

    /// Rows are true labels, columns are predictions, both indexed like `labels`
    pub confusion_matrix: Array2<usize>,
}

impl EvaluationMetrics {
    /// Compute metrics from train and test predictions
    pub fn compute(
        train_true: &[StressCategory],
        train_pred: &[StressCategory],
        test_true: &[StressCategory],
        test_pred: &[StressCategory],
    ) -> Self {
        let labels: Vec<StressCategory> = test_true
            .iter()
            .chain(test_pred)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let matrix = confusion_matrix(test_true, test_pred, &labels);

        let per_class: Vec<ClassMetrics> = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let tp = matrix[[i, i]];
                let predicted = matrix.column(i).sum();
                let support = matrix.row(i).sum();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1_score,
                    support,
                }
            })
            .collect();

        let n_classes = per_class.len();
        let mean = |f: fn(&ClassMetrics) -> f64| {
            if n_classes == 0 {
                0.0
            } else {
                per_class.iter().map(f).sum::<f64>() / n_classes as f64
            }
        };
        let macro_precision = mean(|m| m.precision);
        let macro_recall = mean(|m| m.recall);
        let macro_f1 = mean(|m| m.f1_score);

        let total_support: usize = per_class.iter().map(|m| m.support).sum();
        let weighted_f1 = if total_support == 0 {
            0.0
        } else {
            per_class
                .iter()
                .map(|m| m.f1_score * m.support as f64)
                .sum::<f64>()
                / total_support as f64
        };

        Self {
            train_accuracy: accuracy(train_true, train_pred),
            test_accuracy: accuracy(test_true, test_pred),
            n_train: train_true.len(),
            n_test: test_true.len(),
            labels,
            per_class,
            macro_precision,
            macro_recall,
            macro_f1,
            weighted_f1,
            confusion_matrix: matrix,
        }
    }

    /// Train accuracy minus test accuracy; large positive values suggest overfitting
    pub fn overfit_gap(&self) -> f64 {
        self.train_accuracy - self.test_accuracy
    }

    /// Correct test predictions (the confusion matrix trace)
    pub fn correct_predictions(&self) -> usize {
        self.confusion_matrix.diag().sum()
    }

    pub fn class_metrics(&self, label: StressCategory) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|m| m.label == label)
    }

    /// Plain-text report with per-class rows, averages and the confusion matrix
    pub fn classification_report(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Training accuracy: {:.2}%", self.train_accuracy * 100.0);
        let _ = writeln!(
            out,
            "Test accuracy:     {:.2}% ({}/{})",
            self.test_accuracy * 100.0,
            self.correct_predictions(),
            self.n_test
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>10} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        );
        for m in &self.per_class {
            let _ = writeln!(
                out,
                "{:>10} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                m.label.to_string(),
                m.precision,
                m.recall,
                m.f1_score,
                m.support
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>10} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "macro avg", self.macro_precision, self.macro_recall, self.macro_f1, self.n_test
        );
        let _ = writeln!(
            out,
            "{:>10} {:>10} {:>10} {:>10.2} {:>10}",
            "weighted", "", "", self.weighted_f1, self.n_test
        );

        let _ = writeln!(out);
        let _ = writeln!(out, "Confusion matrix (rows = true, columns = predicted):");
        let _ = write!(out, "{:>10}", "");
        for label in &self.labels {
            let _ = write!(out, " {:>8}", label.to_string());
        }
        let _ = writeln!(out);
        for (i, label) in self.labels.iter().enumerate() {
            let _ = write!(out, "{:>10}", label.to_string());
            for j in 0..self.labels.len() {
                let _ = write!(out, " {:>8}", self.confusion_matrix[[i, j]]);
            }
            let _ = writeln!(out);
        }

        out
    }
}

/// Fraction of matching predictions; 0 for empty input
pub fn accuracy(y_true: &[StressCategory], y_pred: &[StressCategory]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Confusion matrix indexed by `labels`; pairs with a label outside the set are skipped
pub fn confusion_matrix(
    y_true: &[StressCategory],
    y_pred: &[StressCategory],
    labels: &[StressCategory],
) -> Array2<usize> {
    let position = |label: &StressCategory| labels.iter().position(|l| l == label);

    let mut matrix = Array2::zeros((labels.len(), labels.len()));
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        if let (Some(i), Some(j)) = (position(t), position(p)) {
            matrix[[i, j]] += 1;
        }
    }
    matrix
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
