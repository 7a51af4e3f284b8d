//! Desk configuration loaded from TOML with `ORDERDESK_*` environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::error::Result;
use super::state::Role;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DeskConfig {
    pub role: Role,
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            role: Role::Factory,
            display: DisplayConfig::default(),
            timing: TimingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Characters of an annotation shown on a row before it is cut.
    pub annotation_limit: usize,
    pub continuation: String,
    pub log_capacity: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            annotation_limit: 50,
            continuation: "...".to_string(),
            log_capacity: 2_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    pub highlight_ms: u64,
    pub toast_ms: u64,
    pub reload_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            highlight_ms: 2_000,
            toast_ms: 5_000,
            reload_delay_ms: 1_000,
        }
    }
}

impl TimingConfig {
    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "orderdesk_core=debug".
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DeskConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when it exists, falls back to defaults otherwise, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `ORDERDESK_*` overrides read through `lookup`. Numeric values that
    /// do not parse are ignored; an unknown role is an error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ORDERDESK_ROLE") {
            self.role = val.parse()?;
        }
        if let Some(val) = lookup("ORDERDESK_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(limit) = lookup("ORDERDESK_ANNOTATION_LIMIT").and_then(|v| v.parse().ok()) {
            self.display.annotation_limit = limit;
        }
        if let Some(ms) = lookup("ORDERDESK_HIGHLIGHT_MS").and_then(|v| v.parse().ok()) {
            self.timing.highlight_ms = ms;
        }
        if let Some(ms) = lookup("ORDERDESK_TOAST_MS").and_then(|v| v.parse().ok()) {
            self.timing.toast_ms = ms;
        }
        if let Some(ms) = lookup("ORDERDESK_RELOAD_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.timing.reload_delay_ms = ms;
        }
        Ok(())
    }
}
