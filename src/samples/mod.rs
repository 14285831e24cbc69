//! Samples module - labels, labelled samples and the sample store
//!
//! Re-exports only. All logic in submodules.

mod label;
mod sample;
mod store;

pub use label::PostureLabel;
pub use sample::LabeledSample;
pub use store::{SampleCounts, SampleStore};
