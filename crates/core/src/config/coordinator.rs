// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration
//!
//! Loaded from TOML; durations use humantime strings (`"30s"`, `"1m"`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Settings shared by every coordinator a service starts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Lock namespace, part of each coordinator's identity
    pub namespace: String,
    /// Unlock timeout used when a caller does not pass one
    #[serde(with = "humantime_serde")]
    pub unlock_timeout: Duration,
    /// History length at which an instance continues as new
    pub max_history: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            unlock_timeout: Duration::from_secs(60),
            max_history: 1000,
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_unlock_timeout(mut self, timeout: Duration) -> Self {
        self.unlock_timeout = timeout;
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: CoordinatorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }
        if self.namespace.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "namespace must not contain ':' (got '{}')",
                self.namespace
            )));
        }
        if self.unlock_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "unlock_timeout must be greater than zero".into(),
            ));
        }
        if self.max_history == 0 {
            return Err(ConfigError::Invalid(
                "max_history must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
