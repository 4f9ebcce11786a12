//! Consent category classification
//!
//! Maps each permission type to at most one of three fixed categories. The
//! tables below are the single source of truth; a type absent from every table
//! is unclassified and is left out of category-based views.

use crate::model::PermissionType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consent category used to aggregate permission types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    /// AI & Generation
    AiGeneration,
    /// Distribution & Licensing
    DistributionLicensing,
    /// Creative Derivatives
    CreativeDerivatives,
}

const AI_GENERATION: &[PermissionType] = &[
    PermissionType::AiTrainingFullCatalog,
    PermissionType::AiTrainingComposition,
    PermissionType::AiTrainingRecording,
    PermissionType::StyleLearning,
    PermissionType::VoiceCloning,
    PermissionType::LyricReuseConversational,
];

const DISTRIBUTION_LICENSING: &[PermissionType] = &[
    PermissionType::Stream,
    PermissionType::Download,
    PermissionType::SyncLicense,
];

const CREATIVE_DERIVATIVES: &[PermissionType] = &[
    PermissionType::CoverVersions,
    PermissionType::Remix,
    PermissionType::Sampling,
    PermissionType::DerivativeWorks,
];

/// Permission types deliberately left out of every category.
///
/// Dataset inclusion spans AI and licensing concerns, so it is reported on its
/// own rather than folded into either group.
pub const UNCLASSIFIED: &[PermissionType] = &[PermissionType::DatasetInclusion];

impl CategoryId {
    /// Every category, in display order
    pub const ALL: [CategoryId; 3] = [
        CategoryId::AiGeneration,
        CategoryId::DistributionLicensing,
        CategoryId::CreativeDerivatives,
    ];

    /// Stable identifier used for graph nodes
    pub fn node_id(&self) -> &'static str {
        match self {
            CategoryId::AiGeneration => "ai_generation",
            CategoryId::DistributionLicensing => "distribution_licensing",
            CategoryId::CreativeDerivatives => "creative_derivatives",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            CategoryId::AiGeneration => "AI & Generation",
            CategoryId::DistributionLicensing => "Distribution & Licensing",
            CategoryId::CreativeDerivatives => "Creative Derivatives",
        }
    }

    /// Permission types in this category
    pub fn members(&self) -> &'static [PermissionType] {
        match self {
            CategoryId::AiGeneration => AI_GENERATION,
            CategoryId::DistributionLicensing => DISTRIBUTION_LICENSING,
            CategoryId::CreativeDerivatives => CREATIVE_DERIVATIVES,
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category of a permission type, or `None` when unclassified
pub fn classify(permission_type: PermissionType) -> Option<CategoryId> {
    CategoryId::ALL
        .into_iter()
        .find(|category| category.members().contains(&permission_type))
}
