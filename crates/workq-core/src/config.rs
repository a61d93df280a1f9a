//! Registry configuration, loaded from `workq.toml`.
//!
//! Missing fields fall back to defaults. The default layout is the classic
//! pair of kernel queues: qid 0 `hpwork` and qid 1 `lpwork`.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::domain::MAX_QUEUES;
use crate::error::{Result, WorkqError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueConfig {
    pub name: String,
}

impl QueueConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkqConfig {
    /// One entry per queue; the position is the queue id.
    #[serde(default = "default_queues")]
    pub queues: Vec<QueueConfig>,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_queues() -> Vec<QueueConfig> {
    vec![QueueConfig::new("hpwork"), QueueConfig::new("lpwork")]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for WorkqConfig {
    fn default() -> Self {
        Self {
            queues: default_queues(),
            log_level: default_log_level(),
        }
    }
}

impl WorkqConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: WorkqConfig =
            toml::from_str(s).map_err(|e| WorkqError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or use defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WorkqError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queues.is_empty() {
            return Err(WorkqError::Config("at least one queue is required".to_string()));
        }
        if self.queues.len() > MAX_QUEUES {
            return Err(WorkqError::Config(format!(
                "{} queues configured, at most {MAX_QUEUES} allowed",
                self.queues.len()
            )));
        }
        let mut seen = HashSet::new();
        for queue in &self.queues {
            if !seen.insert(queue.name.as_str()) {
                return Err(WorkqError::Config(format!(
                    "duplicate queue name '{}'",
                    queue.name
                )));
            }
        }
        Ok(())
    }
}
