//! TOML-based application configuration.
//!
//! Holds the tunables of the points engine and the tap guard:
//! - Cycle interval and the random point range per cycle
//! - How long a level-up stays published
//! - Tap streak timeout and the tap count that triggers a reset
//!
//! Configuration is stored at `~/.config/medalroom/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Points engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Lowest number of points granted in one cycle (inclusive).
    #[serde(default = "default_min_points")]
    pub min_points: u32,
    /// Highest number of points granted in one cycle (inclusive).
    #[serde(default = "default_max_points")]
    pub max_points: u32,
    #[serde(default = "default_level_up_display_ms")]
    pub level_up_display_ms: u64,
    /// Random seed for reproducible runs (None = seeded from entropy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Tap guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapConfig {
    /// A gap longer than this breaks the streak.
    #[serde(default = "default_tap_timeout_ms")]
    pub timeout_ms: i64,
    /// Streak length that triggers a full reset.
    #[serde(default = "default_tap_threshold")]
    pub threshold: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/medalroom/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub tap: TapConfig,
}

// Default functions
fn default_interval_ms() -> u64 {
    2000
}
fn default_min_points() -> u32 {
    1
}
fn default_max_points() -> u32 {
    5
}
fn default_level_up_display_ms() -> u64 {
    3000
}
fn default_tap_timeout_ms() -> i64 {
    3000
}
fn default_tap_threshold() -> u32 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            min_points: default_min_points(),
            max_points: default_max_points(),
            level_up_display_ms: default_level_up_display_ms(),
            seed: None,
        }
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_tap_timeout_ms(),
            threshold: default_tap_threshold(),
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;

        // `seed` is skipped while unset, so it may be missing from the tree.
        let existing = match obj.get(leaf) {
            Some(existing) => existing.clone(),
            None if key == "engine.seed" => serde_json::Value::Null,
            None => return Err(unknown()),
        };

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) | serde_json::Value::Null => {
                if key == "engine.seed" && value == "none" {
                    serde_json::Value::Null
                } else if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(n) = value.parse::<i64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    /// Load from an explicit file, writing defaults there if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
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

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. Returns error if key is
    /// unknown or the result does not validate.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if self.engine.interval_ms == 0 {
            return invalid("engine.interval_ms", "must be greater than zero");
        }
        if self.engine.min_points == 0 {
            return invalid("engine.min_points", "must be at least 1");
        }
        if self.engine.min_points > self.engine.max_points {
            return invalid("engine.max_points", "must not be below engine.min_points");
        }
        if self.tap.threshold == 0 {
            return invalid("tap.threshold", "must be at least 1");
        }
        if self.tap.timeout_ms < 0 {
            return invalid("tap.timeout_ms", "must not be negative");
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.engine.interval_ms, 2000);
        assert_eq!(cfg.engine.min_points, 1);
        assert_eq!(cfg.engine.max_points, 5);
        assert_eq!(cfg.engine.level_up_display_ms, 3000);
        assert_eq!(cfg.engine.seed, None);
        assert_eq!(cfg.tap.timeout_ms, 3000);
        assert_eq!(cfg.tap.threshold, 5);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[engine]\ninterval_ms = 500\n").unwrap();
        assert_eq!(parsed.engine.interval_ms, 500);
        assert_eq!(parsed.engine.max_points, 5);
        assert_eq!(parsed.tap, TapConfig::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("engine.interval_ms").as_deref(), Some("2000"));
        assert_eq!(cfg.get("tap.threshold").as_deref(), Some("5"));
        assert!(cfg.get("engine.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("tap.threshold", "7").unwrap();
        assert_eq!(cfg.tap.threshold, 7);
    }

    #[test]
    fn apply_sets_and_clears_seed() {
        let mut cfg = Config::default();
        cfg.apply("engine.seed", "42").unwrap();
        assert_eq!(cfg.engine.seed, Some(42));
        cfg.apply("engine.seed", "none").unwrap();
        assert_eq!(cfg.engine.seed, None);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("engine.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("engine.interval_ms", "soon").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn apply_rejects_inverted_point_range() {
        let mut cfg = Config::default();
        let result = cfg.apply("engine.min_points", "9");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.engine.min_points, 1);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "engine = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
