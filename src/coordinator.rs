use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::{ClassifierFactory, KnnFactory};
use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::{BatchStep, EvaluationReport, LiveVerdict, TrainingReport};
use crate::pose::PoseLandmarks;
use crate::samples::{PostureLabel, SampleCounts};
use crate::session::{Feedback, PostureSession};

/// User-facing controls, one per core operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartBatch { label: PostureLabel },
    Cancel,
    Train,
    Evaluate,
    /// `destination` is echoed back on the resulting update.
    Export { destination: Option<String> },
    Import { snapshot: String },
    Clear,
}

#[derive(Debug, Clone)]
pub enum SessionMessage {
    Frame(Option<PoseLandmarks>),
    Command(Command),
}

/// Everything the UI layer needs to redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionUpdate {
    Feedback(Feedback),
    Live(LiveVerdict),
    Counts(SampleCounts),
    /// Sampling controls locked (`true`) or released (`false`)
    Sampling(bool),
    Trained(TrainingReport),
    /// `None` resets the confusion-matrix view to its placeholder
    Evaluation(Option<EvaluationReport>),
    Exported {
        destination: Option<String>,
        snapshot: String,
    },
}

/// One-second countdown ticker.
///
/// At most one ticker task runs at a time. Every start bumps the
/// generation, so ticks already queued by a stopped ticker are ignored.
struct CountdownTimer {
    period: Duration,
    tick_tx: Sender<u64>,
    generation: u64,
    active: Option<(CancellationToken, JoinHandle<()>)>,
}

impl CountdownTimer {
    fn new(period: Duration, tick_tx: Sender<u64>) -> Self {
        Self {
            period,
            tick_tx,
            generation: 0,
            active: None,
        }
    }

    fn start(&mut self) {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        let tick_tx = self.tick_tx.clone();
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        if tick_tx.send(generation).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.active = Some((token, handle));
    }

    fn stop(&mut self) {
        if let Some((token, handle)) = self.active.take() {
            token.cancel();
            handle.abort();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active.is_some() && generation == self.generation
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns the session on a single task; frames, commands and countdown
/// ticks are applied one at a time in arrival order.
struct SessionWorker {
    id: Uuid,
    session: PostureSession,
    timer: CountdownTimer,
    update_tx: Sender<SessionUpdate>,
}

impl SessionWorker {
    async fn run(
        mut self,
        mut message_rx: Receiver<SessionMessage>,
        mut tick_rx: Receiver<u64>,
        cancel_token: CancellationToken,
    ) {
        info!("Session {} started", self.id);
        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                message = message_rx.recv() => match message {
                    Some(SessionMessage::Frame(landmarks)) => self.on_frame(landmarks).await,
                    Some(SessionMessage::Command(command)) => self.on_command(command).await,
                    None => break,
                },
                Some(generation) = tick_rx.recv() => self.on_tick(generation).await,
            }
        }
        self.timer.stop();
        info!("Session {} stopped", self.id);
    }

    async fn publish(&self, update: SessionUpdate) {
        if self.update_tx.send(update).await.is_err() {
            debug!("Update receiver for session {} closed", self.id);
        }
    }

    async fn feedback(&self, feedback: Feedback) {
        self.publish(SessionUpdate::Feedback(feedback)).await;
    }

    async fn report_error(&self, err: &AppError) {
        warn!("Session {}: {}", self.id, err);
        self.feedback(Feedback::from(err)).await;
    }

    async fn on_frame(&mut self, landmarks: Option<PoseLandmarks>) {
        let previous = self.session.live_verdict().cloned();
        if let Some(verdict) = self.session.on_frame(landmarks).await {
            if previous.as_ref() != Some(&verdict) {
                self.publish(SessionUpdate::Live(verdict)).await;
            }
        }
    }

    async fn on_tick(&mut self, generation: u64) {
        if !self.timer.is_current(generation) {
            debug!("Dropping stale tick from countdown {}", generation);
            return;
        }

        match self.session.tick() {
            BatchStep::Idle => self.timer.stop(),
            BatchStep::Countdown(progress) => {
                self.feedback(Feedback::neutral(progress.countdown_text()))
                    .await;
            }
            BatchStep::Captured(progress) => {
                // each repetition gets its own countdown
                self.timer.start();
                self.publish(SessionUpdate::Counts(self.session.counts()))
                    .await;
                self.feedback(Feedback::neutral(progress.countdown_text()))
                    .await;
            }
            BatchStep::Finished { .. } => {
                self.timer.stop();
                self.publish(SessionUpdate::Counts(self.session.counts()))
                    .await;
                self.publish(SessionUpdate::Sampling(false)).await;
                self.feedback(Feedback::good(
                    "Batch complete. Record the other posture or train the model.",
                ))
                .await;
            }
            BatchStep::Aborted { .. } => {
                self.timer.stop();
                self.publish(SessionUpdate::Sampling(false)).await;
                self.report_error(&AppError::PersonLeftFrame).await;
            }
        }
    }

    async fn on_command(&mut self, command: Command) {
        debug!("Session {} command: {:?}", self.id, command);
        match command {
            Command::StartBatch { label } => match self.session.start_batch(label) {
                Ok(progress) => {
                    self.timer.start();
                    self.publish(SessionUpdate::Sampling(true)).await;
                    self.feedback(Feedback::neutral(progress.status_text("Start")))
                        .await;
                }
                Err(e) => self.report_error(&e).await,
            },
            Command::Cancel => match self.session.cancel() {
                Ok(_) => {
                    self.timer.stop();
                    self.publish(SessionUpdate::Sampling(false)).await;
                    self.feedback(Feedback::neutral("Auto-sampling stopped."))
                        .await;
                }
                Err(e) => self.report_error(&e).await,
            },
            Command::Train => match self.session.train().await {
                Ok(report) => {
                    self.publish(SessionUpdate::Trained(report)).await;
                    self.publish(SessionUpdate::Evaluation(None)).await;
                    self.feedback(Feedback::good(format!(
                        "Model trained. Train: {}, Test: {}.",
                        report.train, report.test
                    )))
                    .await;
                }
                Err(e) => self.report_error(&e).await,
            },
            Command::Evaluate => match self.session.evaluate().await {
                Ok(report) => {
                    let message = report.to_string();
                    self.publish(SessionUpdate::Evaluation(Some(report))).await;
                    self.feedback(Feedback::neutral(message)).await;
                }
                Err(e) => self.report_error(&e).await,
            },
            Command::Export { destination } => match self.session.export() {
                Ok(snapshot) => {
                    self.publish(SessionUpdate::Exported {
                        destination,
                        snapshot,
                    })
                    .await;
                    self.feedback(Feedback::neutral("Export ready.")).await;
                }
                Err(e) => self.report_error(&e).await,
            },
            Command::Import { snapshot } => match self.session.import(&snapshot) {
                Ok(count) => {
                    self.publish(SessionUpdate::Counts(self.session.counts()))
                        .await;
                    self.publish(SessionUpdate::Evaluation(None)).await;
                    self.feedback(Feedback::good(format!(
                        "Imported {} samples. Train the model next.",
                        count
                    )))
                    .await;
                }
                Err(e) => self.report_error(&e).await,
            },
            Command::Clear => {
                self.timer.stop();
                self.session.clear();
                self.publish(SessionUpdate::Sampling(false)).await;
                self.publish(SessionUpdate::Counts(self.session.counts()))
                    .await;
                self.publish(SessionUpdate::Evaluation(None)).await;
                self.feedback(Feedback::neutral("Data cleared. Capture new samples."))
                    .await;
            }
        }
    }
}

pub struct SessionCoordinator {
    id: Uuid,
    /// `None` once a graceful shutdown has begun
    message_tx: Option<Sender<SessionMessage>>,
    session_task: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl SessionCoordinator {
    fn new(
        configuration: Configuration,
        factory: Arc<dyn ClassifierFactory>,
    ) -> (Self, Receiver<SessionUpdate>) {
        let id = Uuid::new_v4();
        let cancel_token = CancellationToken::new();
        let (message_tx, message_rx) = mpsc::channel(configuration.message_buffer_size);
        let (update_tx, update_rx) = mpsc::channel(configuration.update_buffer_size);
        let (tick_tx, tick_rx) = mpsc::channel(4);

        let worker = SessionWorker {
            id,
            session: PostureSession::new(&configuration, factory),
            timer: CountdownTimer::new(configuration.tick_interval(), tick_tx),
            update_tx,
        };
        let session_task = tokio::spawn(worker.run(message_rx, tick_rx, cancel_token.clone()));

        (
            Self {
                id,
                message_tx: Some(message_tx),
                session_task: Some(session_task),
                cancel_token,
            },
            update_rx,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Deliver one frame of pose-estimator output (`None`: nobody in view).
    pub async fn send_frame(&self, landmarks: Option<PoseLandmarks>) -> Result<(), AppError> {
        self.send(SessionMessage::Frame(landmarks)).await
    }

    pub async fn send_command(&self, command: Command) -> Result<(), AppError> {
        self.send(SessionMessage::Command(command)).await
    }

    async fn send(&self, message: SessionMessage) -> Result<(), AppError> {
        let message_tx = self
            .message_tx
            .as_ref()
            .ok_or_else(|| AppError::Channel("session is shutting down".to_string()))?;
        message_tx
            .send(message)
            .await
            .map_err(|e| AppError::Channel(e.to_string()))
    }

    /// Stop immediately; queued messages are discarded.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Close the inbox and wait until every queued frame and command has
    /// been applied.
    pub async fn shutdown(mut self) {
        self.message_tx.take();
        if let Some(handle) = self.session_task.take() {
            if let Err(e) = handle.await {
                warn!("Session task ended abnormally: {}", e);
            }
        }
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    factory: Option<Arc<dyn ClassifierFactory>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            factory: None,
        }
    }

    // Overrides the number of captures per batch.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.configuration.batch_size = batch_size;
        self
    }

    // Overrides the countdown length before each capture.
    pub fn countdown_seconds(mut self, countdown_seconds: u32) -> Self {
        self.configuration.countdown_seconds = countdown_seconds;
        self
    }

    // Overrides the minimum number of samples per label needed to train.
    pub fn min_samples_per_label(mut self, min_samples_per_label: usize) -> Self {
        self.configuration.min_samples_per_label = min_samples_per_label;
        self
    }

    pub fn train_split(mut self, train_split: f64) -> Self {
        self.configuration.train_split = train_split;
        self
    }

    pub fn split_seed(mut self, seed: u64) -> Self {
        self.configuration.split_seed = Some(seed);
        self
    }

    pub fn classifier_factory(mut self, factory: Arc<dyn ClassifierFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<(SessionCoordinator, Receiver<SessionUpdate>), AppError> {
        self.configuration.validate()?;
        let factory = self.factory.unwrap_or_else(|| {
            Arc::new(KnnFactory {
                k: self.configuration.knn_k,
            })
        });
        Ok(SessionCoordinator::new(self.configuration, factory))
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}
