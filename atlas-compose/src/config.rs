//! Configuration loading.
//!
//! Configuration comes from a JSON document or from `ATLAS_COMPOSE_*`
//! environment variables. Unset fields keep their defaults.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ATLAS_COMPOSE_PARALLEL` | `batch.parallel` |
//! | `ATLAS_COMPOSE_WORKERS` | `batch.workers` |
//! | `ATLAS_COMPOSE_CONTINUE_ON_ERROR` | `batch.continue_on_error` |
//! | `ATLAS_COMPOSE_SHOW_PROGRESS` | `batch.show_progress` |
//! | `ATLAS_COMPOSE_DRY_RUN` | `pipeline.dry_run` |
//! | `ATLAS_COMPOSE_STOP_ON_ERROR` | `pipeline.stop_on_error` |
//! | `ATLAS_COMPOSE_LOG_LEVEL` | `logging.level` |
//! | `ATLAS_COMPOSE_LOG_FORMAT` | `logging.format` |

use crate::batch::BatchOptions;
use crate::errors::{ComposeError, Result};
use crate::logging::{LogFormat, LoggingConfig};
use crate::pipeline::PipelineOptions;
use serde::{Deserialize, Serialize};

/// Prefix of every environment variable read by [`ComposeConfig::from_env`].
pub const ENV_PREFIX: &str = "ATLAS_COMPOSE_";

/// Complete configuration for batch and pipeline runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Batch processor options.
    pub batch: BatchOptions,
    /// Pipeline options.
    pub pipeline: PipelineOptions,
    /// Logging options.
    pub logging: LoggingConfig,
}

impl ComposeConfig {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Reads the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Reads variables through `lookup`, which returns `None` for unset keys.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| -> Option<(String, String)> {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        let mut config = Self::default();

        if let Some((key, value)) = var("PARALLEL") {
            config.batch.parallel = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("WORKERS") {
            config.batch.workers = value
                .trim()
                .parse()
                .map_err(|_| ComposeError::config(key, format!("expected a worker count, got '{value}'")))?;
        }
        if let Some((key, value)) = var("CONTINUE_ON_ERROR") {
            config.batch.continue_on_error = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("SHOW_PROGRESS") {
            config.batch.show_progress = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("DRY_RUN") {
            config.pipeline.dry_run = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("STOP_ON_ERROR") {
            config.pipeline.stop_on_error = parse_bool(&key, &value)?;
        }
        if let Some((_, value)) = var("LOG_LEVEL") {
            config.logging.level = value;
        }
        if let Some((key, value)) = var("LOG_FORMAT") {
            config.logging.format = LogFormat::parse(&value)
                .ok_or_else(|| ComposeError::config(key, format!("expected 'text' or 'json', got '{value}'")))?;
        }

        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.batch = self.batch.normalized();
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ComposeError::config(key, format!("expected a boolean, got '{value}'"))),
    }
}
