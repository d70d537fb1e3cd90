//! Controller configuration
//!
//! A controller can be configured from a flat TOML file:
//!
//! ```toml
//! refresh_rate_ms = 30
//! workers = 4
//! slow_tick_warning = true
//! ```
//!
//! Missing keys fall back to the defaults.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default tick period in milliseconds
pub const DEFAULT_REFRESH_RATE_MS: u64 = 30;

/// Tick loop and worker pool settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Period between two update passes
    pub refresh_rate_ms: u64,
    /// Number of update workers
    pub workers: usize,
    /// Log a warning when an update pass takes longer than the period
    pub slow_tick_warning: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
            workers: default_workers(),
            slow_tick_warning: true,
        }
    }
}

fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ControllerConfig {
    /// Parse and validate a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ControllerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_rate_ms == 0 {
            return Err(ConfigError::ZeroRefreshRate);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Set the tick period, rounded up to whole milliseconds
    pub fn with_refresh_rate(mut self, period: Duration) -> Self {
        let mut millis = period.as_millis();
        if period.subsec_nanos() % 1_000_000 != 0 {
            millis += 1;
        }
        self.refresh_rate_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_slow_tick_warning(mut self, enabled: bool) -> Self {
        self.slow_tick_warning = enabled;
        self
    }

    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms)
    }
}
