//! Synthetic poses shared by unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::classifier::{Classification, ClassifierFactory, KnnClassifier, PoseClassifier};
use crate::error::ClassifierError;
use crate::pose::{
    LANDMARK_COUNT, LEFT_HIP, LEFT_SHOULDER, Landmark, PoseLandmarks, RIGHT_HIP, RIGHT_SHOULDER,
};
use crate::samples::{LabeledSample, PostureLabel, SampleStore};

/// Lean applied to the head landmarks (0..=10) of a "bad" pose.
pub const SLOUCH_LEAN: f32 = 0.25;

/// Seated pose with the head landmarks shifted sideways by `lean`.
pub fn upright_pose(lean: f32) -> PoseLandmarks {
    let mut landmarks: Vec<Landmark> = (0..LANDMARK_COUNT)
        .map(|i| {
            let i = i as f32;
            Landmark::new(0.3 + 0.012 * i, 0.15 + 0.02 * i, -0.1 + 0.004 * i)
        })
        .collect();

    landmarks[LEFT_SHOULDER] = Landmark::new(0.42, 0.40, -0.05);
    landmarks[RIGHT_SHOULDER] = Landmark::new(0.58, 0.40, -0.05);
    landmarks[LEFT_HIP] = Landmark::new(0.45, 0.70, 0.0);
    landmarks[RIGHT_HIP] = Landmark::new(0.55, 0.70, 0.0);

    for head in landmarks.iter_mut().take(11) {
        head.x += lean;
    }

    PoseLandmarks::try_from(landmarks).expect("synthetic pose is complete")
}

/// Hips at the origin and shoulders a subnormal distance away; every
/// other landmark sits at 0.5.
pub fn collapsed_torso_pose() -> PoseLandmarks {
    let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.5); LANDMARK_COUNT];
    landmarks[LEFT_HIP] = Landmark::new(0.0, 0.0, 0.0);
    landmarks[RIGHT_HIP] = Landmark::new(0.0, 0.0, 0.0);
    landmarks[LEFT_SHOULDER] = Landmark::new(1e-39, 0.0, 0.0);
    landmarks[RIGHT_SHOULDER] = Landmark::new(1e-39, 0.0, 0.0);
    PoseLandmarks::try_from(landmarks).expect("synthetic pose is complete")
}

/// A labelled sample; `variant` adds a small deterministic jitter.
pub fn sample(label: PostureLabel, variant: usize) -> LabeledSample {
    let lean = match label {
        PostureLabel::Good => 0.0,
        PostureLabel::Bad => SLOUCH_LEAN,
    };
    let jitter = 0.002 * variant as f32;
    LabeledSample::capture(label, &upright_pose(lean + jitter))
}

pub fn store_with(good: usize, bad: usize) -> SampleStore {
    let mut store = SampleStore::new();
    for i in 0..good {
        store.push(sample(PostureLabel::Good, i));
    }
    for i in 0..bad {
        store.push(sample(PostureLabel::Bad, i));
    }
    store
}

/// Hands out k-NN classifiers and counts how many it created.
#[derive(Default)]
pub struct CountingFactory {
    pub created: Arc<AtomicUsize>,
}

impl ClassifierFactory for CountingFactory {
    fn create(&self) -> Box<dyn PoseClassifier> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(KnnClassifier::new(3))
    }
}

/// k-NN wrapper whose `classify` fails on every `fail_every`-th call
/// (counting from the first).
pub struct FlakyClassifier {
    inner: KnnClassifier,
    calls: AtomicUsize,
    fail_every: usize,
}

impl FlakyClassifier {
    pub fn new(fail_every: usize) -> Self {
        Self {
            inner: KnnClassifier::new(3),
            calls: AtomicUsize::new(0),
            fail_every: fail_every.max(1),
        }
    }
}

#[async_trait]
impl PoseClassifier for FlakyClassifier {
    async fn add_example(&mut self, features: &[f32], label: &str) -> Result<(), ClassifierError> {
        self.inner.add_example(features, label).await
    }

    async fn classify(&self, features: &[f32]) -> Result<Classification, ClassifierError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % self.fail_every == 0 {
            return Err(ClassifierError::InvalidFeatures);
        }
        self.inner.classify(features).await
    }

    fn num_labels(&self) -> usize {
        self.inner.num_labels()
    }
}

/// Always answers with a fixed label, whatever it was trained on.
pub struct FixedLabelClassifier {
    pub label: String,
    pub labels: usize,
}

#[async_trait]
impl PoseClassifier for FixedLabelClassifier {
    async fn add_example(&mut self, _features: &[f32], _label: &str) -> Result<(), ClassifierError> {
        self.labels = self.labels.max(1);
        Ok(())
    }

    async fn classify(&self, _features: &[f32]) -> Result<Classification, ClassifierError> {
        Ok(Classification {
            label: self.label.clone(),
            confidences: IndexMap::from([(self.label.clone(), 1.0)]),
        })
    }

    fn num_labels(&self) -> usize {
        self.labels
    }
}

/// Accepts examples but never registers a label.
pub struct LabelessClassifier;

#[async_trait]
impl PoseClassifier for LabelessClassifier {
    async fn add_example(&mut self, _features: &[f32], _label: &str) -> Result<(), ClassifierError> {
        Ok(())
    }

    async fn classify(&self, _features: &[f32]) -> Result<Classification, ClassifierError> {
        Err(ClassifierError::Empty)
    }

    fn num_labels(&self) -> usize {
        0
    }
}
