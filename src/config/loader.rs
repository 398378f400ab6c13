//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configurations from YAML files.

use chrono::FixedOffset;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, EngineSettings, OrganizationConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml        # Offset, retention window, server settings
/// └── organization.yaml  # Offices, departments, teams, groups, workers, catalogue
/// ```
///
/// # Example
///
/// ```no_run
/// use worksheet_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// println!("Archiving after {} days", loader.settings().archive_after_days);
/// # Ok::<(), worksheet_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
    utc_offset: FixedOffset,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Fails if either file is missing, contains invalid YAML, or holds an
    /// invalid setting such as a malformed UTC offset.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let organization = Self::load_yaml::<OrganizationConfig>(&path.join("organization.yaml"))?;

        Self::from_parts(settings, organization)
    }

    /// Builds a loader from already-parsed parts, validating the settings.
    pub fn from_parts(settings: EngineSettings, organization: OrganizationConfig) -> EngineResult<Self> {
        let utc_offset = parse_utc_offset(&settings.utc_offset)?;
        if settings.event_buffer == 0 {
            return Err(EngineError::Configuration {
                message: "event_buffer must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            config: EngineConfig::new(settings, organization),
            utc_offset,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        self.config.settings()
    }

    /// Returns the organization seed.
    pub fn organization(&self) -> &OrganizationConfig {
        self.config.organization()
    }

    /// Returns the factory's parsed UTC offset.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }
}

/// Parses an offset of the form `+HH:MM` or `-HH:MM`, at most fourteen hours
/// from UTC.
pub fn parse_utc_offset(value: &str) -> EngineResult<FixedOffset> {
    value
        .parse::<FixedOffset>()
        .ok()
        .filter(|offset| offset.local_minus_utc().abs() <= 14 * 3600)
        .ok_or_else(|| EngineError::Configuration {
            message: format!("invalid utc_offset '{}', expected +HH:MM", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn settings(utc_offset: &str) -> EngineSettings {
        EngineSettings {
            utc_offset: utc_offset.to_string(),
            archive_after_days: 30,
            listen_addr: "127.0.0.1:0".to_string(),
            event_buffer: 16,
        }
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.settings().utc_offset, "+07:00");
        assert_eq!(loader.utc_offset().local_minus_utc(), 7 * 3600);
        assert!(!loader.organization().groups.is_empty());
        assert!(!loader.organization().product_processes.is_empty());
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+07:00").unwrap().local_minus_utc(), 25_200);
        assert_eq!(parse_utc_offset("-03:30").unwrap().local_minus_utc(), -12_600);
        assert_eq!(parse_utc_offset("+00:00").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+14:00").unwrap().local_minus_utc(), 50_400);
    }

    #[test]
    fn test_parse_utc_offset_rejects_garbage() {
        for bad in ["07:00", "+7:00", "+07", "+25:00", "+18:00", "+07:75", "", "+ab:cd"] {
            assert!(
                matches!(parse_utc_offset(bad), Err(EngineError::Configuration { .. })),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_from_parts_rejects_zero_event_buffer() {
        let mut bad = settings("+07:00");
        bad.event_buffer = 0;
        let result = ConfigLoader::from_parts(bad, OrganizationConfig::default());
        assert!(matches!(result, Err(EngineError::Configuration { .. })));
    }

    #[test]
    fn test_settings_defaults_apply() {
        let parsed: EngineSettings =
            serde_yaml::from_str("utc_offset: \"+07:00\"\narchive_after_days: 14\n").unwrap();
        assert_eq!(parsed.listen_addr, "0.0.0.0:8080");
        assert_eq!(parsed.event_buffer, 256);
    }
}
