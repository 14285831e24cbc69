//! Held-out evaluation: 2x2 confusion matrix and accuracy.

use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

use super::trainer::TrainingCoordinator;
use crate::error::AppError;
use crate::samples::PostureLabel;

/// Counts keyed by (actual, predicted): `gb` = actual good, predicted bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub gg: usize,
    pub gb: usize,
    pub bg: usize,
    pub bb: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: PostureLabel, predicted: PostureLabel) {
        let cell = match (actual, predicted) {
            (PostureLabel::Good, PostureLabel::Good) => &mut self.gg,
            (PostureLabel::Good, PostureLabel::Bad) => &mut self.gb,
            (PostureLabel::Bad, PostureLabel::Good) => &mut self.bg,
            (PostureLabel::Bad, PostureLabel::Bad) => &mut self.bb,
        };
        *cell += 1;
    }

    pub fn get(&self, actual: PostureLabel, predicted: PostureLabel) -> usize {
        match (actual, predicted) {
            (PostureLabel::Good, PostureLabel::Good) => self.gg,
            (PostureLabel::Good, PostureLabel::Bad) => self.gb,
            (PostureLabel::Bad, PostureLabel::Good) => self.bg,
            (PostureLabel::Bad, PostureLabel::Bad) => self.bb,
        }
    }

    pub fn total(&self) -> usize {
        self.gg + self.gb + self.bg + self.bb
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub matrix: ConfusionMatrix,
    pub correct: usize,
    /// Samples whose classification call failed
    pub skipped: usize,
    /// Test set size (`n`)
    pub total: usize,
    /// Percentage, 0 when the test set is empty
    pub accuracy: f64,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Test accuracy: {:.1}% (n={}).", self.accuracy, self.total)
    }
}

/// Classify every held-out sample in order, one call at a time.
///
/// A failed call is logged and the sample skipped; predictions outside the
/// two known labels land in no cell and count as incorrect.
#[instrument(skip(trainer), fields(test = trainer.test_set().len()))]
pub async fn evaluate(trainer: &TrainingCoordinator) -> Result<EvaluationReport, AppError> {
    if !trainer.is_trained() {
        return Err(AppError::NotTrained);
    }
    let test_set = trainer.test_set();
    if test_set.is_empty() {
        return Err(AppError::NoTestSet);
    }

    let classifier = trainer.classifier();
    let mut matrix = ConfusionMatrix::default();
    let mut correct = 0;
    let mut skipped = 0;

    for (index, sample) in test_set.iter().enumerate() {
        let prediction = match classifier.classify(&sample.pose.flatten()).await {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!("Classification failed for test sample {}: {}", index, e);
                skipped += 1;
                continue;
            }
        };

        match PostureLabel::from_wire(&prediction.label) {
            Some(predicted) => {
                matrix.record(sample.label, predicted);
                if predicted == sample.label {
                    correct += 1;
                }
            }
            None => warn!("Unrecognized prediction label: {}", prediction.label),
        }
    }

    let total = test_set.len();
    let accuracy = if total > 0 {
        correct as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let report = EvaluationReport {
        matrix,
        correct,
        skipped,
        total,
        accuracy,
    };
    info!("{}", report);
    Ok(report)
}
