//! JSON configuration for the multiplier

use crate::dense::DenseLayout;
use crate::error::{Result, SpmmError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding [`SpmmConfig::thread_count`]
pub const THREADS_ENV_VAR: &str = "SPMM_NUM_THREADS";

/// Multiplier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpmmConfig {
    /// Number of workers; each owns a contiguous range of output rows
    pub thread_count: usize,
    /// Element ordering of dense operands passed as flat slices
    pub layout: DenseLayout,
}

impl Default for SpmmConfig {
    fn default() -> Self {
        Self {
            thread_count: 1,
            layout: DenseLayout::RowMajor,
        }
    }
}

impl SpmmConfig {
    /// Config with the given worker count and default layout
    pub fn with_threads(thread_count: usize) -> Self {
        Self {
            thread_count,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SpmmError::Config(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| SpmmError::Config(format!("Failed to parse JSON: {}", e)))
    }

    /// Save configuration to JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SpmmError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, json)
            .map_err(|e| SpmmError::Config(format!("Failed to write config file: {}", e)))
    }

    /// Apply `SPMM_NUM_THREADS` from the process environment, if set
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(THREADS_ENV_VAR) {
            self.thread_count = raw.trim().parse().map_err(|_| {
                SpmmError::Config(format!("{THREADS_ENV_VAR}={raw:?} is not a thread count"))
            })?;
            log::debug!("thread count overridden from environment: {}", self.thread_count);
        }
        Ok(self)
    }
}
