//! Landmark storage types for one frame of pose-estimator output.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;

// ============================================================================
// LANDMARK INDICES (MediaPipe Pose - 33 total)
// ============================================================================

pub const LANDMARK_COUNT: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// A single 3D landmark point (normalized image coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // 0-1 normalized
    pub y: f32, // 0-1 normalized
    pub z: f32, // relative depth, no stable origin
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// A complete pose: exactly 33 landmarks in the pose model's fixed layout.
///
/// Holding one of these means a person was detected in the frame, so
/// downstream code never has to check for missing joints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f32; 3]>", into = "Vec<[f32; 3]>")]
pub struct PoseLandmarks {
    landmarks: Vec<Landmark>,
}

impl PoseLandmarks {
    /// Build from a flat slice of 99 values (33 landmarks × x, y, z).
    pub fn from_flat(data: &[f32]) -> Result<Self, PoseError> {
        if data.len() != LANDMARK_COUNT * 3 {
            return Err(PoseError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: data.len() / 3,
            });
        }
        let landmarks: Vec<Landmark> = data
            .chunks_exact(3)
            .map(|c| Landmark::new(c[0], c[1], c[2]))
            .collect();
        Self::try_from(landmarks)
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter()
    }

    /// Apply `f` to every landmark, keeping the layout.
    pub fn map(&self, f: impl Fn(&Landmark) -> Landmark) -> Self {
        Self {
            landmarks: self.landmarks.iter().map(f).collect(),
        }
    }
}

impl std::ops::Index<usize> for PoseLandmarks {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Self::Output {
        &self.landmarks[index]
    }
}

impl TryFrom<Vec<Landmark>> for PoseLandmarks {
    type Error = PoseError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self, Self::Error> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(PoseError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: landmarks.len(),
            });
        }
        if !landmarks.iter().all(Landmark::is_finite) {
            return Err(PoseError::NonFinite);
        }
        Ok(Self { landmarks })
    }
}

impl TryFrom<Vec<[f32; 3]>> for PoseLandmarks {
    type Error = PoseError;

    fn try_from(triples: Vec<[f32; 3]>) -> Result<Self, Self::Error> {
        Self::try_from(triples.into_iter().map(Landmark::from).collect::<Vec<_>>())
    }
}

impl From<PoseLandmarks> for Vec<[f32; 3]> {
    fn from(pose: PoseLandmarks) -> Self {
        pose.landmarks.iter().map(|l| [l.x, l.y, l.z]).collect()
    }
}
