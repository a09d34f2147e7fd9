//! Configuration loading for lazytask.
//!
//! Reads retry/backoff and worker-pool settings from TOML:
//!
//! ```toml
//! [retry]
//! try_limit = 4
//! backoff_step_ms = 100
//! backoff_cap_ms = 1000
//!
//! [pool]
//! concurrency = 4
//! ```
//!
//! Missing sections and keys fall back to defaults. Values are validated when
//! the document is loaded, so a loaded [`TaskConfig`] always converts cleanly.

use std::fs;
use std::path::{Path, PathBuf};

use lazytask_types::{BackoffOptions, Concurrency, UsageError};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to parse config: {0}")]
    Syntax(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] UsageError),
}

impl ConfigError {
    /// The file involved, when the error came from [`TaskConfig::load`].
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::Syntax(_) | Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub retry: RetryConfig,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub try_limit: u32,
    pub backoff_step_ms: u64,
    pub backoff_cap_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            try_limit: 3,
            backoff_step_ms: 100,
            backoff_cap_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn backoff_options(&self) -> Result<BackoffOptions, UsageError> {
        BackoffOptions::from_millis(self.try_limit, self.backoff_step_ms, self.backoff_cap_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub concurrency: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl PoolConfig {
    pub fn concurrency(&self) -> Result<Concurrency, UsageError> {
        Concurrency::new(self.concurrency)
    }
}

impl TaskConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let config: Self = match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        if let Err(err) = config.validate() {
            tracing::warn!("Invalid config at {:?}: {}", path, err);
            return Err(err.into());
        }
        tracing::debug!(?path, "Loaded task config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), UsageError> {
        self.retry.backoff_options()?;
        self.pool.concurrency()?;
        Ok(())
    }
}
