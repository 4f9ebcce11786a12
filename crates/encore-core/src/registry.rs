//! Requester registry seam
//!
//! Platform metadata is an injected, read-only dependency. The engine only
//! uses it to enrich override reasons and graph node labels, so a failed lookup
//! degrades to the raw identifier instead of raising an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata returned by a registry lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Identifier the platform is registered under
    pub platform_id: String,
    /// Human-readable name
    pub display_name: String,
    /// Public homepage, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether the platform passed certification, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certified: Option<bool>,
}

impl PlatformInfo {
    /// Create platform info with only an id and display name
    pub fn new(platform_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            platform_id: platform_id.into(),
            display_name: display_name.into(),
            url: None,
            certified: None,
        }
    }

    /// Attach a homepage URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach a certification flag
    pub fn with_certified(mut self, certified: bool) -> Self {
        self.certified = Some(certified);
        self
    }
}

/// Read-only platform registry
pub trait PlatformRegistry: Send + Sync {
    /// Look up a platform by identifier
    fn lookup(&self, platform_id: &str) -> Option<PlatformInfo>;

    /// Display name for a platform, falling back to the raw identifier
    fn display_name(&self, platform_id: &str) -> String {
        match self.lookup(platform_id) {
            Some(info) => info.display_name,
            None => {
                tracing::debug!(platform_id, "registry miss, using raw identifier");
                platform_id.to_string()
            }
        }
    }
}

/// Registry that knows no platforms
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRegistry;

impl PlatformRegistry for EmptyRegistry {
    fn lookup(&self, _platform_id: &str) -> Option<PlatformInfo> {
        None
    }
}

/// Registry backed by a fixed table, typically seeded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    platforms: BTreeMap<String, PlatformInfo>,
}

impl StaticRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a platform, replacing any previous entry with the same id
    pub fn insert(&mut self, info: PlatformInfo) {
        self.platforms.insert(info.platform_id.clone(), info);
    }

    /// Number of registered platforms
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

impl FromIterator<PlatformInfo> for StaticRegistry {
    fn from_iter<T: IntoIterator<Item = PlatformInfo>>(iter: T) -> Self {
        let mut registry = Self::new();
        for info in iter {
            registry.insert(info);
        }
        registry
    }
}

impl PlatformRegistry for StaticRegistry {
    fn lookup(&self, platform_id: &str) -> Option<PlatformInfo> {
        self.platforms.get(platform_id).cloned()
    }
}
