pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod pose;
pub mod samples;
pub mod session;

#[cfg(test)]
mod test_support;

pub use error::{AppError, ClassifierError, ImportError, PoseError};

pub use config::Configuration;
pub use coordinator::{Command, CoordinatorBuilder, SessionCoordinator, SessionUpdate};
pub use session::PostureSession;
