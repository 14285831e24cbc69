use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Good,
    Bad,
}

/// The single human-readable feedback line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub message: String,
    pub tone: Tone,
}

impl Feedback {
    pub fn new(message: impl Into<String>, tone: Tone) -> Self {
        Self {
            message: message.into(),
            tone,
        }
    }

    pub fn neutral(message: impl Into<String>) -> Self {
        Self::new(message, Tone::Neutral)
    }

    pub fn good(message: impl Into<String>) -> Self {
        Self::new(message, Tone::Good)
    }

    pub fn bad(message: impl Into<String>) -> Self {
        Self::new(message, Tone::Bad)
    }
}

impl From<&AppError> for Feedback {
    fn from(err: &AppError) -> Self {
        Feedback::bad(err.to_string())
    }
}
