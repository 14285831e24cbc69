use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::label::PostureLabel;
use crate::pose::{FeatureVector, PoseLandmarks, normalize_pose};

/// One labelled capture. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub label: PostureLabel,
    pub pose: FeatureVector,
    #[serde(default = "Utc::now", deserialize_with = "timestamp_or_now")]
    pub timestamp: DateTime<Utc>,
}

/// Snapshot timestamps are informational: anything that is not an RFC 3339
/// string is replaced by the import time instead of rejecting the file.
fn timestamp_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .unwrap_or_else(Utc::now))
}

impl LabeledSample {
    pub fn new(label: PostureLabel, pose: FeatureVector) -> Self {
        Self {
            label,
            pose,
            timestamp: Utc::now(),
        }
    }

    /// Normalize a live frame and stamp it with the current time.
    pub fn capture(label: PostureLabel, landmarks: &PoseLandmarks) -> Self {
        Self::new(label, normalize_pose(landmarks))
    }
}
