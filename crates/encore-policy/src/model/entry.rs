//! Permission entries

use super::condition::Condition;
use super::permission::{PermissionType, PermissionValue};
use encore_core::{EncoreError, Result};
use serde::{Deserialize, Serialize};

/// Policy for a single permission type within a bundle
///
/// On the wire the decision is flattened into the entry:
/// `{permission_type, value, royalty_rate?, attribution_requirement?,
/// conditions?, territory?}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// Use case this entry governs
    pub permission_type: PermissionType,

    /// Base decision with its carried fields
    #[serde(flatten)]
    pub value: PermissionValue,

    /// Override triggers and uninterpreted conditions, in authoring order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Territory the entry is scoped to, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
}

impl PermissionEntry {
    /// Create an entry with no conditions
    pub fn new(permission_type: PermissionType, value: PermissionValue) -> Self {
        Self {
            permission_type,
            value,
            conditions: Vec::new(),
            territory: None,
        }
    }

    /// Append a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the territory
    pub fn with_territory(mut self, territory: impl Into<String>) -> Self {
        self.territory = Some(territory.into());
        self
    }

    /// First override condition whose platform id equals `requester_id`
    ///
    /// Matching is exact and case-sensitive. A blank requester id never
    /// matches.
    pub fn matching_override(&self, requester_id: &str) -> Option<&str> {
        if requester_id.trim().is_empty() {
            return None;
        }
        self.conditions
            .iter()
            .filter_map(Condition::authorized_platform_id)
            .find(|platform_id| *platform_id == requester_id)
    }

    /// Platforms this entry names in override conditions, in order
    pub fn authorized_platforms(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .filter_map(Condition::authorized_platform_id)
    }

    /// Conditions the resolver does not interpret
    pub fn opaque_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().filter(|c| !c.is_recognized())
    }

    /// Check entry-level invariants
    pub fn validate(&self) -> Result<()> {
        for platform_id in self.authorized_platforms() {
            if platform_id.trim().is_empty() {
                return Err(EncoreError::validation(format!(
                    "{} has an override condition with an empty platform id",
                    self.permission_type
                )));
            }
        }
        if let Some(territory) = &self.territory {
            if territory.trim().is_empty() {
                return Err(EncoreError::validation(format!(
                    "{} has an empty territory",
                    self.permission_type
                )));
            }
        }
        Ok(())
    }
}
