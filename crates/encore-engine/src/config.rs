//! Engine configuration

use encore_core::config::parse_bool;
use encore_core::{EncoreConfig, EncoreError, PlatformInfo, Result, StaticRegistry};
use encore_policy::{PermissionValue, UniformOverride};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Default number of append attempts per decision
pub const DEFAULT_APPEND_RETRIES: u32 = 3;

/// Default tracing filter
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for a [`ConsentEngine`](crate::ConsentEngine)
///
/// ```toml
/// ledger_path = "audit/ledger.jsonl"
/// append_retries = 5
/// default_override = { value = "ALLOW_WITH_ROYALTY", royalty_rate = 0.3 }
///
/// [[platforms]]
/// platform_id = "platform-x"
/// display_name = "Xylo AI"
/// certified = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// JSON-lines ledger file; the ledger stays in memory when unset
    pub ledger_path: Option<PathBuf>,
    /// Sync the ledger file after every append
    pub sync_writes: bool,
    /// Attempts per append before a conflict is reported
    pub append_retries: u32,
    /// Tracing filter directive
    pub log_level: String,
    /// Terms granted to authorized platforms
    pub default_override: PermissionValue,
    /// Registry seed
    pub platforms: Vec<PlatformInfo>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ledger_path: None,
            sync_writes: false,
            append_retries: DEFAULT_APPEND_RETRIES,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            default_override: PermissionValue::Allow,
            platforms: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Registry built from `platforms`
    pub fn registry(&self) -> StaticRegistry {
        self.platforms.iter().cloned().collect()
    }

    /// Override terms built from `default_override`
    pub fn override_terms(&self) -> UniformOverride {
        UniformOverride(self.default_override.clone())
    }
}

impl EncoreConfig for EngineConfig {
    fn apply_override(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "ledger_path" => {
                self.ledger_path = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "sync_writes" => self.sync_writes = parse_bool(key, value)?,
            "append_retries" => {
                self.append_retries = value.trim().parse().map_err(|_| {
                    EncoreError::config(format!("Invalid append_retries: {value}"))
                })?;
            }
            "log_level" => self.log_level = value.trim().to_string(),
            _ => {}
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.append_retries == 0 {
            return Err(EncoreError::config("append_retries must be at least 1"));
        }
        if self.log_level.trim().is_empty() {
            return Err(EncoreError::config("log_level must not be empty"));
        }

        let mut ids = HashSet::new();
        for platform in &self.platforms {
            if platform.platform_id.trim().is_empty() {
                return Err(EncoreError::config("platform_id must not be empty"));
            }
            if !ids.insert(platform.platform_id.as_str()) {
                return Err(EncoreError::config(format!(
                    "platform {} listed twice",
                    platform.platform_id
                )));
            }
        }
        Ok(())
    }
}
