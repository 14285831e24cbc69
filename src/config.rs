use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub min_samples_per_label: usize,
    pub countdown_seconds: u32,
    pub train_split: f64,
    pub batch_size: usize,
    pub knn_k: usize,
    pub tick_interval_ms: u64,
    pub message_buffer_size: usize,
    pub update_buffer_size: usize,
    pub split_seed: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            min_samples_per_label: 20,
            countdown_seconds: 3,
            train_split: 0.8,
            batch_size: 20,
            knn_k: 3,
            tick_interval_ms: 1000,
            message_buffer_size: 64,
            update_buffer_size: 256,
            split_seed: None,
        }
    }
}

impl Configuration {
    const ENV_PREFIX: &'static str = "POSTURE";

    /// Layers an optional config file and `POSTURE_*` environment variables
    /// over the defaults.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let configuration: Configuration = builder
            .add_source(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_samples_per_label == 0 {
            return Err(AppError::Config(
                "Minimum samples per label must be greater than 0".to_string(),
            ));
        }

        if self.countdown_seconds == 0 {
            return Err(AppError::Config(
                "Countdown seconds must be greater than 0".to_string(),
            ));
        }

        if !(self.train_split > 0.0 && self.train_split < 1.0) {
            return Err(AppError::Config(
                "Train split must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(AppError::Config(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if self.knn_k == 0 {
            return Err(AppError::Config("k must be greater than 0".to_string()));
        }

        if self.tick_interval_ms == 0 {
            return Err(AppError::Config(
                "Tick interval must be greater than 0".to_string(),
            ));
        }

        if self.message_buffer_size == 0 || self.update_buffer_size == 0 {
            return Err(AppError::Config(
                "Channel buffer sizes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
