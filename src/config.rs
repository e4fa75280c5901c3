//! Pass Configuration
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`SCOPEWIRE_ISOLATION`, `SCOPEWIRE_REPORT_UNUSED`)
//! 2. Explicit config path (`--config`)
//! 3. `./scopewire.toml`
//! 4. `~/.config/scopewire/config.toml`
//! 5. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};

pub const LOCAL_CONFIG: &str = "scopewire.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PassConfig {
    /// Drop candidates from other partitions
    pub isolation: bool,

    /// Emit SW-150 warnings for bindings nothing consumed
    pub report_unused: bool,

    /// Log pass counters at info level
    pub log_stats: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            isolation: true,
            report_unused: true,
            log_stats: false,
        }
    }
}

impl PassConfig {
    /// Returns `~/.config/scopewire/` on Unix, `%APPDATA%/scopewire/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scopewire")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| WireError::Config {
            reason: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WireError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Resolve the config file, then merge environment overrides
    ///
    /// An explicit path must exist; the implicit locations are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::from_file(path)?.with_env());
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        let config = if local.exists() {
            Self::from_file(&local)?
        } else if Self::config_path().exists() {
            Self::from_file(&Self::config_path())?
        } else {
            Self::default()
        };
        Ok(config.with_env())
    }

    /// Merge with environment variables
    ///
    /// Unparseable or empty values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Some(flag) = env_flag("SCOPEWIRE_ISOLATION") {
            self.isolation = flag;
        }
        if let Some(flag) = env_flag("SCOPEWIRE_REPORT_UNUSED") {
            self.report_unused = flag;
        }
        self
    }

    pub fn without_isolation(mut self) -> Self {
        self.isolation = false;
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PassConfig::default();
        assert!(config.isolation);
        assert!(config.report_unused);
        assert!(!config.log_stats);
    }

    #[test]
    fn test_config_path_contains_scopewire() {
        let path = PassConfig::config_path();
        assert!(path.to_string_lossy().contains("scopewire"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PassConfig::from_toml("isolation = false\n").unwrap();
        assert!(!config.isolation);
        assert!(config.report_unused);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = PassConfig::from_toml("isolation = maybe").unwrap_err();
        assert!(err.to_string().contains("[SW-010]"));
    }

    #[test]
    #[serial]
    fn test_explicit_path_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(PassConfig::load(Some(&missing)).is_err());

        let present = temp_dir.path().join("wire.toml");
        fs::write(&present, "log_stats = true\n").unwrap();
        let config = PassConfig::load(Some(&present)).unwrap();
        assert!(config.log_stats);
    }

    #[test]
    #[serial]
    fn test_env_overrides_config() {
        env::set_var("SCOPEWIRE_ISOLATION", "off");
        env::set_var("SCOPEWIRE_REPORT_UNUSED", "garbage");

        let config = PassConfig::default().with_env();
        assert!(!config.isolation);
        assert!(config.report_unused);

        env::remove_var("SCOPEWIRE_ISOLATION");
        env::remove_var("SCOPEWIRE_REPORT_UNUSED");
    }
}
