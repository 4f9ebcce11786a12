//! Declarative override triggers attached to permission entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire name of the authorized-platform override condition
pub const UNLESS_AUTHORIZED_PLATFORM: &str = "unless_authorized_platform";

/// Condition attached to a permission entry
///
/// Conditions are not predicates over request context. Known kinds trigger
/// resolver behavior; anything else is kept verbatim as [`Condition::Opaque`]
/// so it can be displayed, but it never changes an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "ConditionRecord", into = "ConditionRecord")]
pub enum Condition {
    /// The entry's base value does not apply to this platform
    UnlessAuthorizedPlatform {
        /// Identifier matched exactly against the requester id
        platform_id: String,
    },
    /// Condition kind this engine does not interpret
    Opaque {
        /// Raw condition type
        condition_type: String,
        /// Raw condition value
        value: String,
    },
}

impl Condition {
    /// Override trigger for a platform identifier
    pub fn authorized_platform(platform_id: impl Into<String>) -> Self {
        Condition::UnlessAuthorizedPlatform {
            platform_id: platform_id.into(),
        }
    }

    /// Uninterpreted condition
    pub fn opaque(condition_type: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Opaque {
            condition_type: condition_type.into(),
            value: value.into(),
        }
    }

    /// Raw condition type
    pub fn condition_type(&self) -> &str {
        match self {
            Condition::UnlessAuthorizedPlatform { .. } => UNLESS_AUTHORIZED_PLATFORM,
            Condition::Opaque { condition_type, .. } => condition_type,
        }
    }

    /// Raw condition value
    pub fn value(&self) -> &str {
        match self {
            Condition::UnlessAuthorizedPlatform { platform_id } => platform_id,
            Condition::Opaque { value, .. } => value,
        }
    }

    /// Platform this condition authorizes, if it is an override trigger
    pub fn authorized_platform_id(&self) -> Option<&str> {
        match self {
            Condition::UnlessAuthorizedPlatform { platform_id } => Some(platform_id),
            Condition::Opaque { .. } => None,
        }
    }

    /// Whether the resolver interprets this condition
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Condition::Opaque { .. })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::UnlessAuthorizedPlatform { platform_id } => {
                write!(f, "unless authorized platform {platform_id}")
            }
            Condition::Opaque {
                condition_type,
                value,
            } => write!(f, "{condition_type}={value}"),
        }
    }
}

/// Untyped key/value wire form of a [`Condition`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRecord {
    /// Condition kind
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Condition value
    pub value: String,
}

impl From<ConditionRecord> for Condition {
    fn from(record: ConditionRecord) -> Self {
        if record.condition_type == UNLESS_AUTHORIZED_PLATFORM {
            Condition::UnlessAuthorizedPlatform {
                platform_id: record.value,
            }
        } else {
            Condition::Opaque {
                condition_type: record.condition_type,
                value: record.value,
            }
        }
    }
}

impl From<Condition> for ConditionRecord {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::UnlessAuthorizedPlatform { platform_id } => ConditionRecord {
                condition_type: UNLESS_AUTHORIZED_PLATFORM.to_string(),
                value: platform_id,
            },
            Condition::Opaque {
                condition_type,
                value,
            } => ConditionRecord {
                condition_type,
                value,
            },
        }
    }
}
