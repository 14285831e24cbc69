//! Classifier module - nearest-neighbour posture classification
//!
//! The engine is a black box behind [`PoseClassifier`]. Training always
//! starts from a fresh instance produced by a [`ClassifierFactory`].

mod knn;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ClassifierError;

pub use knn::KnnClassifier;

/// Result of one classification call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    /// Vote share per registered label, in registration order
    pub confidences: IndexMap<String, f32>,
}

impl Classification {
    pub fn confidence(&self) -> f32 {
        self.confidences.get(&self.label).copied().unwrap_or(0.0)
    }
}

#[async_trait]
pub trait PoseClassifier: Send + Sync {
    async fn add_example(&mut self, features: &[f32], label: &str) -> Result<(), ClassifierError>;
    async fn classify(&self, features: &[f32]) -> Result<Classification, ClassifierError>;
    fn num_labels(&self) -> usize;
}

/// Produces empty classifier instances for learn-from-empty retraining.
pub trait ClassifierFactory: Send + Sync {
    fn create(&self) -> Box<dyn PoseClassifier>;
}

impl<F> ClassifierFactory for F
where
    F: Fn() -> Box<dyn PoseClassifier> + Send + Sync,
{
    fn create(&self) -> Box<dyn PoseClassifier> {
        self()
    }
}

/// Factory for the bundled k-NN engine.
#[derive(Debug, Clone, Copy)]
pub struct KnnFactory {
    pub k: usize,
}

impl ClassifierFactory for KnnFactory {
    fn create(&self) -> Box<dyn PoseClassifier> {
        Box::new(KnnClassifier::new(self.k))
    }
}
