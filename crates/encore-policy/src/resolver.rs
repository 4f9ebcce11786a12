//! Override resolution
//!
//! Computes the effective decision for a requester:
//! 1. no entry for the permission type: the bundle default
//! 2. an `unless_authorized_platform` condition naming the requester: the
//!    platform's override terms (first matching condition wins)
//! 3. otherwise: the entry's base value
//!
//! The resolver is pure. Recording the decision in the audit ledger is the
//! caller's job.

use crate::model::{PermissionEntry, PermissionType, PermissionValue};
use encore_core::{EmptyRegistry, PlatformRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Reason recorded when the bundle default applies
pub const REASON_BUNDLE_DEFAULT: &str = "no entry; bundle default applied";

/// Reason recorded when the entry's base value applies
pub const REASON_BASE_POLICY: &str = "base policy applied";

/// Which rule produced a decision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionBasis {
    /// No entry existed for the permission type
    BundleDefault,
    /// The entry's base value applied
    BasePolicy,
    /// An authorized-platform override applied
    PlatformOverride {
        /// Platform named by the matching condition
        platform_id: String,
    },
}

/// Effective decision for one request
///
/// Serialized as `{value, royalty_rate?, attribution_requirement?, reason,
/// basis}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedDecision {
    /// Decision with carried fields
    #[serde(flatten)]
    pub value: PermissionValue,
    /// Human-readable explanation
    pub reason: String,
    /// Rule that produced the decision
    pub basis: DecisionBasis,
}

impl ResolvedDecision {
    /// Whether an authorized-platform override produced this decision
    pub fn is_override(&self) -> bool {
        matches!(self.basis, DecisionBasis::PlatformOverride { .. })
    }
}

/// Terms granted to a platform when an override condition names it
///
/// Conditions only trigger the override path; the decision itself comes from
/// here.
pub trait OverrideTerms: Send + Sync {
    /// Decision for `platform_id` on `permission_type`
    fn terms_for(&self, platform_id: &str, permission_type: PermissionType) -> PermissionValue;
}

/// Same terms for every authorized platform
///
/// The granted value is not compared with the entry's base value, so an
/// override can grant the value the base policy already held. The decision is
/// still marked `DecisionBasis::PlatformOverride`; configure terms that differ
/// from the base values when the override must change the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformOverride(pub PermissionValue);

impl Default for UniformOverride {
    fn default() -> Self {
        Self(PermissionValue::Allow)
    }
}

impl OverrideTerms for UniformOverride {
    fn terms_for(&self, _platform_id: &str, _permission_type: PermissionType) -> PermissionValue {
        self.0.clone()
    }
}

/// Per-platform, per-permission-type terms with a fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsTable {
    terms: BTreeMap<(String, PermissionType), PermissionValue>,
    fallback: PermissionValue,
}

impl TermsTable {
    /// Empty table granting `fallback` to every authorized platform
    pub fn new(fallback: PermissionValue) -> Self {
        Self {
            terms: BTreeMap::new(),
            fallback,
        }
    }

    /// Set the terms for one platform and permission type
    pub fn with_terms(
        mut self,
        platform_id: impl Into<String>,
        permission_type: PermissionType,
        value: PermissionValue,
    ) -> Self {
        self.terms.insert((platform_id.into(), permission_type), value);
        self
    }
}

impl OverrideTerms for TermsTable {
    fn terms_for(&self, platform_id: &str, permission_type: PermissionType) -> PermissionValue {
        self.terms
            .get(&(platform_id.to_string(), permission_type))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Stateless resolver, safe to share across threads
#[derive(Clone)]
pub struct OverrideResolver {
    terms: Arc<dyn OverrideTerms>,
    registry: Arc<dyn PlatformRegistry>,
}

impl OverrideResolver {
    /// Resolver with explicit override terms and registry
    pub fn new(terms: Arc<dyn OverrideTerms>, registry: Arc<dyn PlatformRegistry>) -> Self {
        Self { terms, registry }
    }

    /// Resolver with the given terms and no registry
    pub fn with_terms(terms: Arc<dyn OverrideTerms>) -> Self {
        Self::new(terms, Arc::new(EmptyRegistry))
    }

    /// Registry used to name platforms in reasons
    pub fn registry(&self) -> &Arc<dyn PlatformRegistry> {
        &self.registry
    }

    /// Compute the effective decision
    pub fn resolve(
        &self,
        entry: Option<&PermissionEntry>,
        requester_id: &str,
        bundle_default: &PermissionValue,
    ) -> ResolvedDecision {
        let Some(entry) = entry else {
            return ResolvedDecision {
                value: bundle_default.clone(),
                reason: REASON_BUNDLE_DEFAULT.to_string(),
                basis: DecisionBasis::BundleDefault,
            };
        };

        if let Some(platform_id) = entry.matching_override(requester_id) {
            let value = self.terms.terms_for(platform_id, entry.permission_type);
            let display_name = self.registry.display_name(platform_id);
            let reason = if display_name == platform_id {
                format!("authorized platform override for {platform_id}")
            } else {
                format!("authorized platform override for {display_name} ({platform_id})")
            };
            tracing::debug!(
                permission_type = %entry.permission_type,
                platform_id,
                value = %value,
                "override condition matched"
            );
            return ResolvedDecision {
                value,
                reason,
                basis: DecisionBasis::PlatformOverride {
                    platform_id: platform_id.to_string(),
                },
            };
        }

        ResolvedDecision {
            value: entry.value.clone(),
            reason: REASON_BASE_POLICY.to_string(),
            basis: DecisionBasis::BasePolicy,
        }
    }
}

impl Default for OverrideResolver {
    fn default() -> Self {
        Self::with_terms(Arc::new(UniformOverride::default()))
    }
}

impl fmt::Debug for OverrideResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Condition;
    use encore_core::{PlatformInfo, StaticRegistry};

    fn voice_cloning() -> PermissionEntry {
        PermissionEntry::new(PermissionType::VoiceCloning, PermissionValue::Deny)
            .with_condition(Condition::authorized_platform("platform-x"))
    }

    #[test]
    fn test_missing_entry_uses_bundle_default() {
        let decision = OverrideResolver::default().resolve(None, "platform-x", &PermissionValue::Ask);
        assert_eq!(decision.value, PermissionValue::Ask);
        assert_eq!(decision.reason, REASON_BUNDLE_DEFAULT);
        assert_eq!(decision.basis, DecisionBasis::BundleDefault);
    }

    #[test]
    fn test_override_for_authorized_platform() {
        let resolver = OverrideResolver::default();
        let entry = voice_cloning();

        let decision = resolver.resolve(Some(&entry), "platform-x", &PermissionValue::Ask);
        assert_ne!(decision.value, PermissionValue::Deny);
        assert!(decision.is_override());
        assert!(decision.reason.contains("platform-x"));

        let decision = resolver.resolve(Some(&entry), "platform-y", &PermissionValue::Ask);
        assert_eq!(decision.value, PermissionValue::Deny);
        assert_eq!(decision.reason, REASON_BASE_POLICY);
    }

    #[test]
    fn test_override_terms_supply_carried_fields() {
        let terms = TermsTable::new(PermissionValue::Allow).with_terms(
            "platform-x",
            PermissionType::VoiceCloning,
            PermissionValue::with_royalty(0.4).unwrap(),
        );
        let resolver = OverrideResolver::with_terms(Arc::new(terms));

        let decision = resolver.resolve(Some(&voice_cloning()), "platform-x", &PermissionValue::Ask);
        assert_eq!(decision.value.royalty_rate().map(|r| r.value()), Some(0.4));
    }

    #[test]
    fn test_first_matching_condition_wins() {
        let entry = PermissionEntry::new(PermissionType::Remix, PermissionValue::Deny)
            .with_condition(Condition::opaque("note", "platform-x"))
            .with_condition(Condition::authorized_platform("platform-x"))
            .with_condition(Condition::authorized_platform("platform-x"));
        let resolver = OverrideResolver::default();

        let first = resolver.resolve(Some(&entry), "platform-x", &PermissionValue::Ask);
        let second = resolver.resolve(Some(&entry), "platform-x", &PermissionValue::Ask);
        assert_eq!(first, second);
        assert_eq!(
            first.basis,
            DecisionBasis::PlatformOverride {
                platform_id: "platform-x".to_string()
            }
        );
    }

    #[test]
    fn test_opaque_conditions_are_inert() {
        let entry = PermissionEntry::new(PermissionType::Remix, PermissionValue::Deny)
            .with_condition(Condition::opaque("unless_certified", "platform-x"));
        let decision =
            OverrideResolver::default().resolve(Some(&entry), "platform-x", &PermissionValue::Ask);
        assert_eq!(decision.value, PermissionValue::Deny);
        assert_eq!(decision.basis, DecisionBasis::BasePolicy);
    }

    #[test]
    fn test_blank_requester_falls_through() {
        let resolver = OverrideResolver::default();
        for requester in ["", "   "] {
            let decision = resolver.resolve(Some(&voice_cloning()), requester, &PermissionValue::Ask);
            assert_eq!(decision.value, PermissionValue::Deny);
        }
    }

    #[test]
    fn test_reason_uses_registry_name() {
        let registry = StaticRegistry::from_iter([PlatformInfo::new("platform-x", "Xylo AI")]);
        let resolver =
            OverrideResolver::new(Arc::new(UniformOverride::default()), Arc::new(registry));

        let decision = resolver.resolve(Some(&voice_cloning()), "platform-x", &PermissionValue::Ask);
        assert_eq!(
            decision.reason,
            "authorized platform override for Xylo AI (platform-x)"
        );
    }

    #[test]
    fn test_decision_wire_shape() {
        let decision = ResolvedDecision {
            value: PermissionValue::with_attribution("Credit Nova").unwrap(),
            reason: REASON_BASE_POLICY.to_string(),
            basis: DecisionBasis::BasePolicy,
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "value": "ALLOW_WITH_ATTRIBUTION",
                "attribution_requirement": "Credit Nova",
                "reason": "base policy applied",
                "basis": {"kind": "base_policy"}
            })
        );
    }
}
