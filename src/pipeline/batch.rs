//! Countdown-driven batch capture.
//!
//! The state machine owns no timers. Each call to [`BatchCapture::tick`]
//! means one second elapsed; the coordinator decides where ticks come from.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::pose::PoseLandmarks;
use crate::samples::{LabeledSample, PostureLabel, SampleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub label: PostureLabel,
    pub remaining: u32,
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// e.g. `Countdown: 2 | Batch: good posture (4/20)`
    pub fn status_text(&self, prefix: &str) -> String {
        format!(
            "{} | Batch: {} ({}/{})",
            prefix,
            self.label.friendly_name(),
            self.completed + 1,
            self.total
        )
    }

    pub fn countdown_text(&self) -> String {
        self.status_text(&format!("Countdown: {}", self.remaining))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Idle,
    Counting(BatchProgress),
}

/// Outcome of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStep {
    /// No batch running; the tick was stale.
    Idle,
    /// Still counting down.
    Countdown(BatchProgress),
    /// A sample was committed and the next countdown started.
    Captured(BatchProgress),
    /// The last repetition was committed.
    Finished { label: PostureLabel, total: usize },
    /// Nobody was in frame at countdown zero. Earlier samples stay.
    Aborted { label: PostureLabel, completed: usize },
}

pub struct BatchCapture {
    state: BatchState,
    countdown_seconds: u32,
    batch_size: usize,
}

impl BatchCapture {
    pub fn new(countdown_seconds: u32, batch_size: usize) -> Self {
        Self {
            state: BatchState::Idle,
            countdown_seconds: countdown_seconds.max(1),
            batch_size: batch_size.max(1),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BatchState::Counting(_))
    }

    pub fn progress(&self) -> Option<BatchProgress> {
        match self.state {
            BatchState::Idle => None,
            BatchState::Counting(progress) => Some(progress),
        }
    }

    pub fn start(
        &mut self,
        label: PostureLabel,
        person_present: bool,
    ) -> Result<BatchProgress, AppError> {
        if self.is_active() {
            return Err(AppError::SamplingActive);
        }
        if !person_present {
            return Err(AppError::NoPersonInFrame);
        }

        let progress = BatchProgress {
            label,
            remaining: self.countdown_seconds,
            completed: 0,
            total: self.batch_size,
        };
        self.state = BatchState::Counting(progress);
        info!("Batch started: {} x{}", label, self.batch_size);
        Ok(progress)
    }

    /// Advance one second. At countdown zero the current frame is checked
    /// for a person (and only then).
    pub fn tick(&mut self, current: Option<&PoseLandmarks>, store: &mut SampleStore) -> BatchStep {
        let BatchState::Counting(mut progress) = self.state else {
            debug!("Ignoring tick while idle");
            return BatchStep::Idle;
        };

        progress.remaining = progress.remaining.saturating_sub(1);
        if progress.remaining > 0 {
            self.state = BatchState::Counting(progress);
            return BatchStep::Countdown(progress);
        }

        let Some(landmarks) = current else {
            warn!(
                "No person in frame at capture time, aborting batch after {}/{}",
                progress.completed, progress.total
            );
            self.state = BatchState::Idle;
            return BatchStep::Aborted {
                label: progress.label,
                completed: progress.completed,
            };
        };

        store.push(LabeledSample::capture(progress.label, landmarks));
        progress.completed += 1;

        if progress.completed >= progress.total {
            info!("Batch finished: {} x{}", progress.label, progress.total);
            self.state = BatchState::Idle;
            return BatchStep::Finished {
                label: progress.label,
                total: progress.total,
            };
        }

        progress.remaining = self.countdown_seconds;
        self.state = BatchState::Counting(progress);
        BatchStep::Captured(progress)
    }

    pub fn cancel(&mut self) -> Result<BatchProgress, AppError> {
        match self.state {
            BatchState::Idle => Err(AppError::NotSampling),
            BatchState::Counting(progress) => {
                self.state = BatchState::Idle;
                info!(
                    "Batch cancelled after {}/{}",
                    progress.completed, progress.total
                );
                Ok(progress)
            }
        }
    }
}
