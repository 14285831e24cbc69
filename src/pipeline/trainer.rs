use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::split::stratified_split;
use crate::classifier::{ClassifierFactory, PoseClassifier};
use crate::config::Configuration;
use crate::error::AppError;
use crate::samples::{LabeledSample, PostureLabel, SampleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrainingReport {
    pub train: usize,
    pub test: usize,
}

/// Owns the classifier state and the held-out test subset.
///
/// Every successful `train` replaces the classifier with a fresh instance
/// fed only the new train subset, so nothing from an earlier split leaks in.
pub struct TrainingCoordinator {
    factory: Arc<dyn ClassifierFactory>,
    classifier: Box<dyn PoseClassifier>,
    test_set: Vec<LabeledSample>,
    trained: bool,
    min_samples_per_label: usize,
    train_ratio: f64,
    rng: StdRng,
}

impl TrainingCoordinator {
    pub fn new(
        factory: Arc<dyn ClassifierFactory>,
        min_samples_per_label: usize,
        train_ratio: f64,
    ) -> Self {
        Self {
            classifier: factory.create(),
            factory,
            test_set: Vec::new(),
            trained: false,
            min_samples_per_label,
            train_ratio,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn from_configuration(
        configuration: &Configuration,
        factory: Arc<dyn ClassifierFactory>,
    ) -> Self {
        let coordinator = Self::new(
            factory,
            configuration.min_samples_per_label,
            configuration.train_split,
        );
        match configuration.split_seed {
            Some(seed) => coordinator.with_seed(seed),
            None => coordinator,
        }
    }

    /// Deterministic shuffling, for reproducible splits.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn classifier(&self) -> &dyn PoseClassifier {
        self.classifier.as_ref()
    }

    pub fn test_set(&self) -> &[LabeledSample] {
        &self.test_set
    }

    #[instrument(skip(self, store), fields(samples = store.len()))]
    pub async fn train(&mut self, store: &SampleStore) -> Result<TrainingReport, AppError> {
        let good = store.count(PostureLabel::Good);
        let bad = store.count(PostureLabel::Bad);
        if good < self.min_samples_per_label || bad < self.min_samples_per_label {
            warn!("Not enough samples to train: good={}, bad={}", good, bad);
            return Err(AppError::InsufficientSamples {
                good,
                bad,
                required: self.min_samples_per_label,
            });
        }

        let split = stratified_split(store.samples(), self.train_ratio, &mut self.rng);
        if split.test.is_empty() {
            return Err(AppError::EmptyTestSet);
        }

        // Built off to the side so a failure leaves the old model in place
        let mut classifier = self.factory.create();
        for sample in &split.train {
            classifier
                .add_example(&sample.pose.flatten(), sample.label.as_str())
                .await?;
        }

        let report = TrainingReport {
            train: split.train.len(),
            test: split.test.len(),
        };
        self.classifier = classifier;
        self.test_set = split.test;
        self.trained = true;

        info!("Model trained. Train: {}, Test: {}", report.train, report.test);
        Ok(report)
    }

    /// Drop the model and the test subset.
    pub fn reset(&mut self) {
        self.classifier = self.factory.create();
        self.test_set.clear();
        self.trained = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KnnFactory;
    use crate::test_support::{CountingFactory, store_with};

    fn knn_trainer() -> TrainingCoordinator {
        TrainingCoordinator::new(Arc::new(KnnFactory { k: 3 }), 20, 0.8).with_seed(11)
    }

    #[tokio::test]
    async fn trains_on_stratified_split() {
        let mut trainer = knn_trainer();
        let report = trainer.train(&store_with(25, 25)).await.unwrap();

        assert_eq!(report, TrainingReport { train: 40, test: 10 });
        assert!(trainer.is_trained());
        assert_eq!(trainer.test_set().len(), 10);
        assert_eq!(trainer.classifier().num_labels(), 2);
    }

    #[tokio::test]
    async fn insufficient_samples_reports_shortfall_without_mutation() {
        let mut trainer = knn_trainer();
        trainer.train(&store_with(25, 25)).await.unwrap();
        let previous_test: Vec<_> = trainer.test_set().to_vec();

        let result = trainer.train(&store_with(30, 4)).await;
        match result {
            Err(AppError::InsufficientSamples { good, bad, required }) => {
                assert_eq!((good, bad, required), (30, 4, 20));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(trainer.is_trained());
        assert_eq!(trainer.test_set(), previous_test.as_slice());
    }

    #[tokio::test]
    async fn untrained_stays_untrained_on_failure() {
        let mut trainer = knn_trainer();
        assert!(trainer.train(&store_with(19, 40)).await.is_err());
        assert!(!trainer.is_trained());
        assert_eq!(trainer.classifier().num_labels(), 0);
    }

    #[tokio::test]
    async fn single_sample_labels_cannot_form_a_test_set() {
        let mut trainer =
            TrainingCoordinator::new(Arc::new(KnnFactory { k: 3 }), 1, 0.8).with_seed(3);
        let result = trainer.train(&store_with(1, 1)).await;
        assert!(matches!(result, Err(AppError::EmptyTestSet)));
        assert!(!trainer.is_trained());
    }

    #[tokio::test]
    async fn every_retrain_starts_from_an_empty_classifier() {
        let factory = CountingFactory::default();
        let created = factory.created.clone();
        let mut trainer = TrainingCoordinator::new(Arc::new(factory), 20, 0.8);
        assert_eq!(created.load(std::sync::atomic::Ordering::SeqCst), 1);

        trainer.train(&store_with(20, 20)).await.unwrap();
        trainer.train(&store_with(25, 25)).await.unwrap();
        assert_eq!(created.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reset_forgets_model_and_test_set() {
        let mut trainer = knn_trainer();
        trainer.train(&store_with(20, 20)).await.unwrap();
        trainer.reset();
        assert!(!trainer.is_trained());
        assert!(trainer.test_set().is_empty());
        assert_eq!(trainer.classifier().num_labels(), 0);
    }
}
