//! Pose module - landmark types and feature normalization
//!
//! Re-exports only. All logic in submodules.

mod landmark;
mod normalizer;

pub use landmark::{
    LANDMARK_COUNT, LEFT_HIP, LEFT_SHOULDER, Landmark, NOSE, PoseLandmarks, RIGHT_HIP,
    RIGHT_SHOULDER,
};
pub use normalizer::{FeatureVector, normalize_pose};
