//! Core configuration traits for the Encore configuration system

use crate::{EncoreError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Prefix for environment variables that override configuration values
pub const ENV_PREFIX: &str = "ENCORE_";

/// Core trait for Encore configuration types
///
/// Configuration is layered: defaults, then an optional file, then
/// `ENCORE_`-prefixed environment variables. The result is validated once
/// after all layers are applied.
pub trait EncoreConfig: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Apply a single `ENCORE_`-stripped key/value override.
    ///
    /// Unrecognized keys are ignored; malformed values are errors.
    fn apply_override(&mut self, key: &str, value: &str) -> Result<()>;

    /// Validate the configuration
    fn validate(&self) -> Result<()>;

    /// Load configuration from a file, choosing the format by extension
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EncoreError::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| EncoreError::config(format!("Invalid TOML: {e}"))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| EncoreError::config(format!("Invalid JSON: {e}"))),
            _ => Err(EncoreError::config(format!(
                "Unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Merge overrides from an iterator of environment-style pairs
    fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                self.apply_override(&stripped.to_ascii_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Merge with process environment variables
    fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Defaults, then the file if it exists, then environment, then validation
    fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from_file(path)?,
            Some(path) => {
                tracing::debug!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse a boolean override value
pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(EncoreError::config(format!(
            "Invalid boolean for {key}: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct SampleConfig {
        retries: u32,
        verbose: bool,
    }

    impl Default for SampleConfig {
        fn default() -> Self {
            Self {
                retries: 3,
                verbose: false,
            }
        }
    }

    impl EncoreConfig for SampleConfig {
        fn apply_override(&mut self, key: &str, value: &str) -> Result<()> {
            match key {
                "retries" => {
                    self.retries = value
                        .parse()
                        .map_err(|_| EncoreError::config("Invalid retries"))?;
                }
                "verbose" => self.verbose = parse_bool(key, value)?,
                _ => {}
            }
            Ok(())
        }

        fn validate(&self) -> Result<()> {
            if self.retries == 0 {
                return Err(EncoreError::config("retries must be at least 1"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "retries = 7").unwrap();

        let config = SampleConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.retries, 7);
        assert!(!config.verbose);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(SampleConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_vars_ignores_foreign_prefix() {
        let mut config = SampleConfig::default();
        config
            .merge_with_vars(vec![
                ("ENCORE_RETRIES".to_string(), "5".to_string()),
                ("ENCORE_VERBOSE".to_string(), "yes".to_string()),
                ("OTHER_RETRIES".to_string(), "99".to_string()),
            ])
            .unwrap();

        assert_eq!(config.retries, 5);
        assert!(config.verbose);
    }

    #[test]
    fn test_malformed_override_is_error() {
        let mut config = SampleConfig::default();
        let result = config.merge_with_vars(vec![("ENCORE_VERBOSE".to_string(), "maybe".to_string())]);
        assert!(result.is_err());
    }
}
