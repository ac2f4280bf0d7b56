//! Configuration for loop defaults.
//!
//! Loaded from YAML with a fallback chain: explicit path, then
//! `~/.config/loopkit/loopkit.yml`, then `./loopkit.yml`, then defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LoopError, Result};
use crate::handle::FailurePolicy;
use crate::strategy::DEFAULT_INTERVAL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub log_level: Option<String>,
    /// Delay used by throttled loops that were given no interval.
    ///
    /// Must be positive. A loop that should not sleep asks for
    /// `Duration::ZERO` through `throttled_at` instead.
    pub default_interval_ms: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            default_interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            failure_policy: FailurePolicy::Contain,
        }
    }
}

impl LoopConfig {
    /// Default interval as a `Duration`
    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }

    /// Filter handed to the logger when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Reject a zero default interval, which would make every throttled
    /// loop without an explicit interval spin.
    pub fn validate(&self) -> Result<()> {
        if self.default_interval_ms == 0 {
            return Err(LoopError::InvalidConfig("default_interval_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit path must load; no fallback
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
