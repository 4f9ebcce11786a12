//! Permission types and decision values

use encore_core::{EncoreError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Use case a third party asks permission for
///
/// The enumeration is closed. Unknown names fail to parse rather than being
/// coerced to a nearby variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionType {
    /// Interactive or radio-style streaming
    Stream,
    /// Permanent download
    Download,
    /// Synchronization with visual media
    SyncLicense,
    /// AI training on the full catalog
    AiTrainingFullCatalog,
    /// AI training on the composition only
    AiTrainingComposition,
    /// AI training on the sound recording only
    AiTrainingRecording,
    /// Learning the artist's style
    StyleLearning,
    /// Synthesizing the artist's voice
    VoiceCloning,
    /// Reusing lyrics in conversational agents
    LyricReuseConversational,
    /// Cover versions
    CoverVersions,
    /// Remixes
    Remix,
    /// Sampling
    Sampling,
    /// Other derivative works
    DerivativeWorks,
    /// Inclusion in a dataset
    DatasetInclusion,
}

impl PermissionType {
    /// Every permission type, in declaration order
    pub const ALL: [PermissionType; 14] = [
        PermissionType::Stream,
        PermissionType::Download,
        PermissionType::SyncLicense,
        PermissionType::AiTrainingFullCatalog,
        PermissionType::AiTrainingComposition,
        PermissionType::AiTrainingRecording,
        PermissionType::StyleLearning,
        PermissionType::VoiceCloning,
        PermissionType::LyricReuseConversational,
        PermissionType::CoverVersions,
        PermissionType::Remix,
        PermissionType::Sampling,
        PermissionType::DerivativeWorks,
        PermissionType::DatasetInclusion,
    ];

    /// Wire name of this permission type
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::Stream => "STREAM",
            PermissionType::Download => "DOWNLOAD",
            PermissionType::SyncLicense => "SYNC_LICENSE",
            PermissionType::AiTrainingFullCatalog => "AI_TRAINING_FULL_CATALOG",
            PermissionType::AiTrainingComposition => "AI_TRAINING_COMPOSITION",
            PermissionType::AiTrainingRecording => "AI_TRAINING_RECORDING",
            PermissionType::StyleLearning => "STYLE_LEARNING",
            PermissionType::VoiceCloning => "VOICE_CLONING",
            PermissionType::LyricReuseConversational => "LYRIC_REUSE_CONVERSATIONAL",
            PermissionType::CoverVersions => "COVER_VERSIONS",
            PermissionType::Remix => "REMIX",
            PermissionType::Sampling => "SAMPLING",
            PermissionType::DerivativeWorks => "DERIVATIVE_WORKS",
            PermissionType::DatasetInclusion => "DATASET_INCLUSION",
        }
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionType {
    type Err = EncoreError;

    fn from_str(s: &str) -> Result<Self> {
        PermissionType::ALL
            .iter()
            .copied()
            .find(|pt| pt.as_str() == s)
            .ok_or_else(|| EncoreError::unknown_permission_type(s))
    }
}

/// Royalty rate within `[0, 1]`
///
/// Always finite, so equality and ordering are total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RoyaltyRate(f64);

impl RoyaltyRate {
    /// Create a rate, rejecting NaN, infinities, and values outside `[0, 1]`
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(EncoreError::validation(format!(
                "royalty rate {rate} is outside [0, 1]"
            )));
        }
        // Fold -0.0 into 0.0 so bitwise hashing agrees with equality
        Ok(Self(if rate == 0.0 { 0.0 } else { rate }))
    }

    /// The rate as a fraction
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RoyaltyRate {
    type Error = EncoreError;

    fn try_from(rate: f64) -> Result<Self> {
        Self::new(rate)
    }
}

impl From<RoyaltyRate> for f64 {
    fn from(rate: RoyaltyRate) -> Self {
        rate.0
    }
}

impl PartialEq for RoyaltyRate {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for RoyaltyRate {}

impl PartialOrd for RoyaltyRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoyaltyRate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for RoyaltyRate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for RoyaltyRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * 100.0)
    }
}

/// Decision kind without carried fields, as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionValueKind {
    /// Use is allowed
    Allow,
    /// Use is denied
    Deny,
    /// Requester must ask the rights holder
    Ask,
    /// Allowed when the attribution requirement is met
    AllowWithAttribution,
    /// Allowed at a royalty rate
    AllowWithRoyalty,
}

impl fmt::Display for PermissionValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionValueKind::Allow => "ALLOW",
            PermissionValueKind::Deny => "DENY",
            PermissionValueKind::Ask => "ASK",
            PermissionValueKind::AllowWithAttribution => "ALLOW_WITH_ATTRIBUTION",
            PermissionValueKind::AllowWithRoyalty => "ALLOW_WITH_ROYALTY",
        };
        f.write_str(name)
    }
}

/// Decision outcome with its carried fields
///
/// Serialized as `{value, royalty_rate?, attribution_requirement?}`.
/// Deserialization rejects carried fields that do not belong to the kind and
/// kinds that are missing their required field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PermissionValueRecord", into = "PermissionValueRecord")]
pub enum PermissionValue {
    /// Use is allowed
    Allow,
    /// Use is denied
    Deny,
    /// Requester must ask the rights holder
    Ask,
    /// Allowed when the attribution requirement is met
    AllowWithAttribution {
        /// Non-empty attribution text
        requirement: String,
    },
    /// Allowed at a royalty rate
    AllowWithRoyalty {
        /// Rate owed to the rights holder
        rate: RoyaltyRate,
    },
}

impl PermissionValue {
    /// Build a value from a kind and optional carried fields, validating the
    /// combination
    pub fn new(
        kind: PermissionValueKind,
        royalty_rate: Option<f64>,
        attribution_requirement: Option<String>,
    ) -> Result<Self> {
        match (kind, royalty_rate, attribution_requirement) {
            (PermissionValueKind::Allow, None, None) => Ok(PermissionValue::Allow),
            (PermissionValueKind::Deny, None, None) => Ok(PermissionValue::Deny),
            (PermissionValueKind::Ask, None, None) => Ok(PermissionValue::Ask),
            (PermissionValueKind::AllowWithRoyalty, Some(rate), None) => {
                Ok(PermissionValue::AllowWithRoyalty {
                    rate: RoyaltyRate::new(rate)?,
                })
            }
            (PermissionValueKind::AllowWithRoyalty, None, _) => Err(EncoreError::validation(
                "ALLOW_WITH_ROYALTY requires a royalty_rate",
            )),
            (PermissionValueKind::AllowWithAttribution, None, Some(requirement)) => {
                Self::with_attribution(requirement)
            }
            (PermissionValueKind::AllowWithAttribution, _, None) => Err(EncoreError::validation(
                "ALLOW_WITH_ATTRIBUTION requires an attribution_requirement",
            )),
            (kind, royalty_rate, attribution_requirement) => {
                let mut extra = Vec::new();
                if royalty_rate.is_some() && kind != PermissionValueKind::AllowWithRoyalty {
                    extra.push("royalty_rate");
                }
                if attribution_requirement.is_some()
                    && kind != PermissionValueKind::AllowWithAttribution
                {
                    extra.push("attribution_requirement");
                }
                Err(EncoreError::validation(format!(
                    "{kind} does not carry {}",
                    extra.join(" or ")
                )))
            }
        }
    }

    /// Allowed at the given royalty rate
    pub fn with_royalty(rate: f64) -> Result<Self> {
        Ok(PermissionValue::AllowWithRoyalty {
            rate: RoyaltyRate::new(rate)?,
        })
    }

    /// Allowed with an attribution requirement, which must not be blank
    pub fn with_attribution(requirement: impl Into<String>) -> Result<Self> {
        let requirement = requirement.into();
        if requirement.trim().is_empty() {
            return Err(EncoreError::validation(
                "attribution_requirement must not be empty",
            ));
        }
        Ok(PermissionValue::AllowWithAttribution { requirement })
    }

    /// Kind of this decision
    pub fn kind(&self) -> PermissionValueKind {
        match self {
            PermissionValue::Allow => PermissionValueKind::Allow,
            PermissionValue::Deny => PermissionValueKind::Deny,
            PermissionValue::Ask => PermissionValueKind::Ask,
            PermissionValue::AllowWithAttribution { .. } => {
                PermissionValueKind::AllowWithAttribution
            }
            PermissionValue::AllowWithRoyalty { .. } => PermissionValueKind::AllowWithRoyalty,
        }
    }

    /// Royalty rate, for `ALLOW_WITH_ROYALTY`
    pub fn royalty_rate(&self) -> Option<RoyaltyRate> {
        match self {
            PermissionValue::AllowWithRoyalty { rate } => Some(*rate),
            _ => None,
        }
    }

    /// Attribution requirement, for `ALLOW_WITH_ATTRIBUTION`
    pub fn attribution_requirement(&self) -> Option<&str> {
        match self {
            PermissionValue::AllowWithAttribution { requirement } => Some(requirement),
            _ => None,
        }
    }

    /// Whether the decision permits use, possibly with terms attached
    pub fn is_grant(&self) -> bool {
        matches!(
            self,
            PermissionValue::Allow
                | PermissionValue::AllowWithAttribution { .. }
                | PermissionValue::AllowWithRoyalty { .. }
        )
    }
}

impl fmt::Display for PermissionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionValue::AllowWithAttribution { requirement } => {
                write!(f, "{} ({requirement})", self.kind())
            }
            PermissionValue::AllowWithRoyalty { rate } => write!(f, "{} ({rate})", self.kind()),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Flat wire form of a [`PermissionValue`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionValueRecord {
    /// Decision kind
    pub value: PermissionValueKind,
    /// Royalty rate, only for `ALLOW_WITH_ROYALTY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub royalty_rate: Option<f64>,
    /// Attribution text, only for `ALLOW_WITH_ATTRIBUTION`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution_requirement: Option<String>,
}

impl TryFrom<PermissionValueRecord> for PermissionValue {
    type Error = EncoreError;

    fn try_from(record: PermissionValueRecord) -> Result<Self> {
        PermissionValue::new(
            record.value,
            record.royalty_rate,
            record.attribution_requirement,
        )
    }
}

impl From<PermissionValue> for PermissionValueRecord {
    fn from(value: PermissionValue) -> Self {
        let kind = value.kind();
        match value {
            PermissionValue::AllowWithRoyalty { rate } => PermissionValueRecord {
                value: kind,
                royalty_rate: Some(rate.value()),
                attribution_requirement: None,
            },
            PermissionValue::AllowWithAttribution { requirement } => PermissionValueRecord {
                value: kind,
                royalty_rate: None,
                attribution_requirement: Some(requirement),
            },
            _ => PermissionValueRecord {
                value: kind,
                royalty_rate: None,
                attribution_requirement: None,
            },
        }
    }
}
