//! Feature normalization: translation- and scale-invariant pose features.

use serde::{Deserialize, Serialize};

use super::landmark::{
    LANDMARK_COUNT, LEFT_HIP, LEFT_SHOULDER, PoseLandmarks, RIGHT_HIP, RIGHT_SHOULDER,
};
use crate::error::PoseError;

/// Normalized pose: 33 `[x', y', z']` triples, all finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f32; 3]>", into = "Vec<[f32; 3]>")]
pub struct FeatureVector {
    points: Vec<[f32; 3]>,
}

impl FeatureVector {
    /// Flattened classifier input: `[x0, y0, z0, x1, ...]`, 99 floats.
    pub fn flatten(&self) -> Vec<f32> {
        self.points.iter().flatten().copied().collect()
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }
}

impl TryFrom<Vec<[f32; 3]>> for FeatureVector {
    type Error = PoseError;

    fn try_from(points: Vec<[f32; 3]>) -> Result<Self, Self::Error> {
        if points.len() != LANDMARK_COUNT {
            return Err(PoseError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: points.len(),
            });
        }
        if !points.iter().flatten().all(|v| v.is_finite()) {
            return Err(PoseError::NonFinite);
        }
        Ok(Self { points })
    }
}

impl From<FeatureVector> for Vec<[f32; 3]> {
    fn from(features: FeatureVector) -> Self {
        features.points
    }
}

/// Re-center on the hip midpoint and divide by torso length.
///
/// Torso length is the xy distance between the hip and shoulder midpoints.
/// When it is zero, subnormal, or would push any feature out of f32 range,
/// the scale falls back to 1. z is scaled but never re-centered.
pub fn normalize_pose(pose: &PoseLandmarks) -> FeatureVector {
    let (left_hip, right_hip) = (pose[LEFT_HIP], pose[RIGHT_HIP]);
    let center_x = (left_hip.x + right_hip.x) / 2.0;
    let center_y = (left_hip.y + right_hip.y) / 2.0;

    let (left_shoulder, right_shoulder) = (pose[LEFT_SHOULDER], pose[RIGHT_SHOULDER]);
    let shoulder_x = (left_shoulder.x + right_shoulder.x) / 2.0;
    let shoulder_y = (left_shoulder.y + right_shoulder.y) / 2.0;

    let torso = (shoulder_x - center_x).hypot(shoulder_y - center_y);
    if torso.is_normal() {
        let points = project(pose, center_x, center_y, torso);
        if all_finite(&points) {
            return FeatureVector { points };
        }
    }

    // Unscaled differences of finite inputs can only overflow to +-inf.
    let points = project(pose, center_x, center_y, 1.0)
        .into_iter()
        .map(|point| point.map(|v| v.clamp(f32::MIN, f32::MAX)))
        .collect();
    FeatureVector { points }
}

fn project(pose: &PoseLandmarks, center_x: f32, center_y: f32, scale: f32) -> Vec<[f32; 3]> {
    pose.iter()
        .map(|lm| {
            [
                (lm.x - center_x) / scale,
                (lm.y - center_y) / scale,
                lm.z / scale,
            ]
        })
        .collect()
}

fn all_finite(points: &[[f32; 3]]) -> bool {
    points.iter().flatten().all(|v| v.is_finite())
}
