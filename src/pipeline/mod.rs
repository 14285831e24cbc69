//! Sampling-and-evaluation pipeline
//!
//! batch capture -> store -> stratified split -> train -> evaluate / live

pub mod batch;
pub mod evaluation;
pub mod live;
pub mod split;
pub mod trainer;

pub use batch::{BatchCapture, BatchProgress, BatchStep};
pub use evaluation::{ConfusionMatrix, EvaluationReport, evaluate};
pub use live::{LivePredictor, LiveVerdict};
pub use split::{Split, stratified_split};
pub use trainer::{TrainingCoordinator, TrainingReport};
