//! TOML-based application configuration.
//!
//! Holds the timer durations and the alert thresholds. Configuration is
//! stored at `~/.config/tasktempo/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::data_dir;
use crate::error::ConfigError;

/// Countdown configuration. Durations are in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_short_break_duration")]
    pub short_break_duration: u32,
    /// Ticker period. Each tick counts down one second regardless.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl TimerConfig {
    pub fn focus_duration_secs(&self) -> u64 {
        u64::from(self.focus_duration) * 60
    }

    pub fn short_break_duration_secs(&self) -> u64 {
        u64::from(self.short_break_duration) * 60
    }
}

/// Alert thresholds, in minutes unless the name says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_excessive_time")]
    pub excessive_time_min: u32,
    #[serde(default = "default_advanced_excessive_time")]
    pub advanced_excessive_time_min: u32,
    /// A focus duration above this selects `advanced_excessive_time_min`.
    #[serde(default = "default_advanced_focus_threshold")]
    pub advanced_focus_threshold_min: u32,
    #[serde(default = "default_missing_break_sessions")]
    pub missing_break_sessions: u32,
    #[serde(default = "default_prolonged_navigation")]
    pub prolonged_navigation_min: u32,
    #[serde(default = "default_dismiss_expiry")]
    pub dismiss_expiry_min: u32,
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tasktempo/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

// Default functions
fn default_focus_duration() -> u32 {
    25
}
fn default_short_break_duration() -> u32 {
    5
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_excessive_time() -> u32 {
    60
}
fn default_advanced_excessive_time() -> u32 {
    90
}
fn default_advanced_focus_threshold() -> u32 {
    25
}
fn default_missing_break_sessions() -> u32 {
    3
}
fn default_prolonged_navigation() -> u32 {
    10
}
fn default_dismiss_expiry() -> u32 {
    120
}
fn default_evaluation_interval() -> u64 {
    60
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            short_break_duration: default_short_break_duration(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            excessive_time_min: default_excessive_time(),
            advanced_excessive_time_min: default_advanced_excessive_time(),
            advanced_focus_threshold_min: default_advanced_focus_threshold(),
            missing_break_sessions: default_missing_break_sessions(),
            prolonged_navigation_min: default_prolonged_navigation(),
            dismiss_expiry_min: default_dismiss_expiry(),
            evaluation_interval_secs: default_evaluation_interval(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        let mut current = root;
        if let Some(parent) = parent {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
            serde_json::Value::Object(_) => {
                return Err(invalid("key names a section, not a value".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value in memory by dot-separated key. The caller saves.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Every leaf as `(dotted key, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            flatten("", &json, &mut out);
        }
        out
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

/// Read access to the live configuration.
///
/// Engines read durations when a session starts or resets, never while it
/// counts down.
pub trait SettingsSource: Send + Sync {
    fn timer(&self) -> TimerConfig;
    fn alerts(&self) -> AlertConfig;
}

/// Shared, mutable configuration handle. Clones see the same values.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Config>>,
}

impl SharedSettings {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn get(&self) -> Config {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn update(&self, edit: impl FnOnce(&mut Config)) {
        let mut config = self.inner.write().unwrap_or_else(|e| e.into_inner());
        edit(&mut config);
    }
}

impl SettingsSource for SharedSettings {
    fn timer(&self) -> TimerConfig {
        self.get().timer
    }

    fn alerts(&self) -> AlertConfig {
        self.get().alerts
    }
}

impl SettingsSource for Config {
    fn timer(&self) -> TimerConfig {
        self.timer.clone()
    }

    fn alerts(&self) -> AlertConfig {
        self.alerts.clone()
    }
}
