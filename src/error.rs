use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not enough data. Good: {good}/{required}, Bad: {bad}/{required}")]
    InsufficientSamples {
        good: usize,
        bad: usize,
        required: usize,
    },
    #[error("Could not build a test set. Collect more data.")]
    EmptyTestSet,
    #[error("Train the model before computing test accuracy.")]
    NotTrained,
    #[error("No test set available. Train the model first.")]
    NoTestSet,
    #[error("No person in frame. Step into view and try again.")]
    NoPersonInFrame,
    #[error("No pose found at the moment of capture. Batch stopped.")]
    PersonLeftFrame,
    #[error("Sampling is in progress. Cancel it first.")]
    SamplingActive,
    #[error("No sampling is in progress.")]
    NotSampling,
    #[error("No data to export.")]
    NothingToExport,
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Pose error: {0}")]
    Pose(#[from] PoseError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Session channel error: {0}")]
    Channel(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

// Snapshot import errors. Any of these rejects the whole file.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON does not have the expected format (top level must be an array)")]
    NotAnArray,
    #[error("JSON contains an invalid pose at index {index}: {reason}")]
    InvalidSample { index: usize, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("classifier has no examples")]
    Empty,
    #[error("feature dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("feature vector contains non-finite values")]
    InvalidFeatures,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("expected {expected} landmarks, found {found}")]
    LandmarkCount { expected: usize, found: usize },
    #[error("pose contains non-finite coordinates")]
    NonFinite,
}
