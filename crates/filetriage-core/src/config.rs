/// Pipeline configuration.
///
/// Loaded from an optional JSON file; every field has a default so an empty
/// object (or no file at all) is a valid configuration. Command-line flags
/// are applied on top by the frontend.
use crate::modules::DEFAULT_WORKFLOW;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Worker threads used for batches of passes and for file ingestion.
    pub workers: usize,
    /// Run the modules of one pass concurrently.
    pub parallel_modules: bool,
    /// Per-module `process` time limit. `None` disables the limit.
    pub module_timeout_ms: Option<u64>,
    /// Workflow used when the caller does not name one.
    pub default_workflow: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            parallel_modules: true,
            module_timeout_ms: None,
            default_workflow: DEFAULT_WORKFLOW.to_owned(),
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.default_workflow.trim().is_empty() {
            return Err(ConfigError::Invalid("default_workflow must not be empty".into()));
        }
        if self.module_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "module_timeout_ms must be greater than 0 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn module_timeout(&self) -> Option<Duration> {
        self.module_timeout_ms.map(Duration::from_millis)
    }
}
