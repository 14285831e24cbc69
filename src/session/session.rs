use std::sync::Arc;

use tracing::info;

use crate::classifier::ClassifierFactory;
use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::{
    BatchCapture, BatchProgress, BatchStep, EvaluationReport, LivePredictor, LiveVerdict,
    TrainingCoordinator, TrainingReport, evaluate,
};
use crate::pose::PoseLandmarks;
use crate::samples::{PostureLabel, SampleCounts, SampleStore};

/// Everything one user session owns.
///
/// The store owns the samples, the trainer owns the classifier and the test
/// subset. `current_landmarks` is replaced by every frame.
pub struct PostureSession {
    store: SampleStore,
    batch: BatchCapture,
    trainer: TrainingCoordinator,
    live: LivePredictor,
    current_landmarks: Option<PoseLandmarks>,
    last_evaluation: Option<EvaluationReport>,
}

impl PostureSession {
    pub fn new(configuration: &Configuration, factory: Arc<dyn ClassifierFactory>) -> Self {
        Self {
            store: SampleStore::new(),
            batch: BatchCapture::new(configuration.countdown_seconds, configuration.batch_size),
            trainer: TrainingCoordinator::from_configuration(configuration, factory),
            live: LivePredictor::new(),
            current_landmarks: None,
            last_evaluation: None,
        }
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn trainer(&self) -> &TrainingCoordinator {
        &self.trainer
    }

    pub fn counts(&self) -> SampleCounts {
        self.store.counts()
    }

    pub fn is_sampling(&self) -> bool {
        self.batch.is_active()
    }

    pub fn batch_progress(&self) -> Option<BatchProgress> {
        self.batch.progress()
    }

    pub fn person_in_frame(&self) -> bool {
        self.current_landmarks.is_some()
    }

    pub fn last_evaluation(&self) -> Option<&EvaluationReport> {
        self.last_evaluation.as_ref()
    }

    pub fn live_verdict(&self) -> Option<&LiveVerdict> {
        self.live.last()
    }

    /// Store the frame and run a best-effort live prediction on it.
    pub async fn on_frame(&mut self, landmarks: Option<PoseLandmarks>) -> Option<LiveVerdict> {
        self.current_landmarks = landmarks;
        self.live
            .predict(&self.trainer, self.current_landmarks.as_ref())
            .await
    }

    pub fn start_batch(&mut self, label: PostureLabel) -> Result<BatchProgress, AppError> {
        let person_present = self.person_in_frame();
        self.batch.start(label, person_present)
    }

    /// One countdown second elapsed.
    pub fn tick(&mut self) -> BatchStep {
        self.batch
            .tick(self.current_landmarks.as_ref(), &mut self.store)
    }

    pub fn cancel(&mut self) -> Result<BatchProgress, AppError> {
        self.batch.cancel()
    }

    pub async fn train(&mut self) -> Result<TrainingReport, AppError> {
        self.ensure_idle()?;
        let report = self.trainer.train(&self.store).await?;
        self.last_evaluation = None;
        Ok(report)
    }

    pub async fn evaluate(&mut self) -> Result<EvaluationReport, AppError> {
        self.ensure_idle()?;
        let report = evaluate(&self.trainer).await?;
        self.last_evaluation = Some(report.clone());
        Ok(report)
    }

    pub fn export(&self) -> Result<String, AppError> {
        self.ensure_idle()?;
        if self.store.is_empty() {
            return Err(AppError::NothingToExport);
        }
        Ok(self.store.export_json()?)
    }

    /// Replace all samples with a snapshot; the model must be retrained.
    pub fn import(&mut self, text: &str) -> Result<usize, AppError> {
        self.ensure_idle()?;
        let imported = self.store.import_json(text)?;
        self.trainer.reset();
        self.last_evaluation = None;
        Ok(imported)
    }

    /// Stop any sampling and forget samples, model and results.
    pub fn clear(&mut self) {
        // NotSampling is expected when idle
        self.batch.cancel().ok();
        self.store.clear();
        self.trainer.reset();
        self.live.reset();
        self.last_evaluation = None;
        info!("Session data cleared");
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.batch.is_active() {
            return Err(AppError::SamplingActive);
        }
        Ok(())
    }
}
