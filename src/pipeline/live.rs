use serde::Serialize;
use tracing::{debug, warn};

use super::trainer::TrainingCoordinator;
use crate::pose::{PoseLandmarks, normalize_pose};
use crate::samples::PostureLabel;

/// Per-frame verdict shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "label", rename_all = "snake_case")]
pub enum LiveVerdict {
    NoPerson,
    NotTrained,
    Good,
    Bad,
    Unrecognized(String),
}

impl LiveVerdict {
    pub fn badge(&self) -> &'static str {
        match self {
            LiveVerdict::Good => "Good",
            LiveVerdict::Bad => "Bad",
            _ => "Live",
        }
    }
}

/// Best-effort live classification. Never returns an error.
#[derive(Debug, Default)]
pub struct LivePredictor {
    last: Option<LiveVerdict>,
}

impl LivePredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&LiveVerdict> {
        self.last.as_ref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// `None` means the classifier call failed; the previous verdict stands.
    pub async fn predict(
        &mut self,
        trainer: &TrainingCoordinator,
        landmarks: Option<&PoseLandmarks>,
    ) -> Option<LiveVerdict> {
        let Some(landmarks) = landmarks else {
            return Some(self.remember(LiveVerdict::NoPerson));
        };

        if !trainer.is_trained() || trainer.classifier().num_labels() == 0 {
            return Some(self.remember(LiveVerdict::NotTrained));
        }

        let features = normalize_pose(landmarks).flatten();
        match trainer.classifier().classify(&features).await {
            Ok(result) => {
                debug!("Live prediction: {} ({:.2})", result.label, result.confidence());
                let verdict = match PostureLabel::from_wire(&result.label) {
                    Some(PostureLabel::Good) => LiveVerdict::Good,
                    Some(PostureLabel::Bad) => LiveVerdict::Bad,
                    None => LiveVerdict::Unrecognized(result.label),
                };
                Some(self.remember(verdict))
            }
            Err(e) => {
                warn!("Live classification failed: {}", e);
                None
            }
        }
    }

    fn remember(&mut self, verdict: LiveVerdict) -> LiveVerdict {
        self.last = Some(verdict.clone());
        verdict
    }
}
