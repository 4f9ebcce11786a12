//! Permission bundles
//!
//! A [`BundleDraft`] is the editable form; [`PermissionBundle`] is the
//! validated, immutable form. Drafts become bundles only through
//! [`BundleDraft::build`], and deserializing a bundle goes through the same
//! validation, so a `PermissionBundle` value always satisfies the model
//! invariants.

use super::delegation::DelegationChain;
use super::entry::PermissionEntry;
use super::permission::{PermissionType, PermissionValue};
use crate::resolver::{OverrideResolver, ResolvedDecision};
use chrono::{DateTime, Utc};
use encore_core::{EncoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What part of a catalog a bundle covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleScope {
    /// The whole catalog
    Catalog,
    /// A single release
    Release,
    /// A single sound recording
    Recording,
    /// A single musical work
    Work,
}

impl BundleScope {
    /// Whether bundles of this scope name the scoped entity
    pub fn requires_scope_entity(&self) -> bool {
        !matches!(self, BundleScope::Catalog)
    }
}

impl fmt::Display for BundleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BundleScope::Catalog => "CATALOG",
            BundleScope::Release => "RELEASE",
            BundleScope::Recording => "RECORDING",
            BundleScope::Work => "WORK",
        };
        f.write_str(name)
    }
}

/// Identity of a bundle lineage across versions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BundleKey {
    /// Owning entity
    pub entity_id: String,
    /// Covered scope
    pub scope: BundleScope,
    /// Scoped release, recording, or work
    pub scope_entity_id: Option<String>,
}

impl BundleKey {
    /// Key for a catalog-wide bundle
    pub fn catalog(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            scope: BundleScope::Catalog,
            scope_entity_id: None,
        }
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope_entity_id {
            Some(scoped) => write!(f, "{}/{}/{scoped}", self.entity_id, self.scope),
            None => write!(f, "{}/{}", self.entity_id, self.scope),
        }
    }
}

fn first_version() -> u64 {
    1
}

/// Editable bundle contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDraft {
    /// Owning entity
    pub entity_id: String,
    /// Covered scope
    pub scope: BundleScope,
    /// Scoped release, recording, or work; absent for catalog bundles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_entity_id: Option<String>,
    /// At most one entry per permission type
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
    /// Start of the effective window
    pub effective_from: DateTime<Utc>,
    /// Exclusive end of the effective window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_until: Option<DateTime<Utc>>,
    /// Parties authorized to edit, root to leaf
    #[serde(default)]
    pub delegation_chain: DelegationChain,
    /// Decision for permission types without an entry
    pub default_permission: PermissionValue,
    /// Version number; assigned by the bundle store on publish
    #[serde(default = "first_version")]
    pub version: u64,
}

impl BundleDraft {
    /// Start a catalog-wide draft
    pub fn new(
        entity_id: impl Into<String>,
        default_permission: PermissionValue,
        effective_from: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            scope: BundleScope::Catalog,
            scope_entity_id: None,
            permissions: Vec::new(),
            effective_from,
            effective_until: None,
            delegation_chain: DelegationChain::default(),
            default_permission,
            version: first_version(),
        }
    }

    /// Narrow the draft to a release, recording, or work
    pub fn with_scope(mut self, scope: BundleScope, scope_entity_id: impl Into<String>) -> Self {
        self.scope = scope;
        self.scope_entity_id = Some(scope_entity_id.into());
        self
    }

    /// Append an entry
    pub fn with_entry(mut self, entry: PermissionEntry) -> Self {
        self.permissions.push(entry);
        self
    }

    /// Set the exclusive end of the effective window
    pub fn with_effective_until(mut self, until: DateTime<Utc>) -> Self {
        self.effective_until = Some(until);
        self
    }

    /// Set the delegation chain
    pub fn with_delegation_chain(mut self, chain: DelegationChain) -> Self {
        self.delegation_chain = chain;
        self
    }

    /// Insert an entry, replacing any entry for the same permission type
    pub fn upsert_entry(&mut self, entry: PermissionEntry) {
        match self
            .permissions
            .iter_mut()
            .find(|existing| existing.permission_type == entry.permission_type)
        {
            Some(existing) => *existing = entry,
            None => self.permissions.push(entry),
        }
    }

    /// Remove the entry for a permission type, returning it
    pub fn remove_entry(&mut self, permission_type: PermissionType) -> Option<PermissionEntry> {
        let position = self
            .permissions
            .iter()
            .position(|entry| entry.permission_type == permission_type)?;
        Some(self.permissions.remove(position))
    }

    /// Lineage key of this draft
    pub fn key(&self) -> BundleKey {
        BundleKey {
            entity_id: self.entity_id.clone(),
            scope: self.scope,
            scope_entity_id: self.scope_entity_id.clone(),
        }
    }

    /// Validate and freeze the draft
    pub fn build(self) -> Result<PermissionBundle> {
        self.validate()?;
        Ok(PermissionBundle { inner: self })
    }

    fn validate(&self) -> Result<()> {
        if self.entity_id.trim().is_empty() {
            return Err(EncoreError::validation("bundle entity_id must not be empty"));
        }

        if self.version == 0 {
            return Err(EncoreError::validation("bundle versions start at 1"));
        }

        match (&self.scope_entity_id, self.scope.requires_scope_entity()) {
            (None, true) => {
                return Err(EncoreError::validation(format!(
                    "{} bundle requires a scope_entity_id",
                    self.scope
                )));
            }
            (Some(_), false) => {
                return Err(EncoreError::validation(
                    "CATALOG bundle must not carry a scope_entity_id",
                ));
            }
            (Some(scoped), true) if scoped.trim().is_empty() => {
                return Err(EncoreError::validation("scope_entity_id must not be empty"));
            }
            _ => {}
        }

        if let Some(until) = self.effective_until {
            if until <= self.effective_from {
                return Err(EncoreError::validation(format!(
                    "effective_until {until} must be after effective_from {}",
                    self.effective_from
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for entry in &self.permissions {
            if !seen.insert(entry.permission_type) {
                return Err(EncoreError::validation(format!(
                    "duplicate entry for {}",
                    entry.permission_type
                )));
            }
            entry.validate()?;
        }

        self.delegation_chain.verify(&self.entity_id)
    }
}

/// Validated, immutable permission bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BundleDraft", into = "BundleDraft")]
pub struct PermissionBundle {
    inner: BundleDraft,
}

impl PermissionBundle {
    /// Parse and validate a bundle from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EncoreError::validation(format!("invalid bundle: {e}")))
    }

    /// Parse and validate a bundle from TOML
    ///
    /// Timestamps must be quoted RFC 3339 strings.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EncoreError::validation(format!("invalid bundle: {e}")))
    }

    /// Owning entity
    pub fn entity_id(&self) -> &str {
        &self.inner.entity_id
    }

    /// Covered scope
    pub fn scope(&self) -> BundleScope {
        self.inner.scope
    }

    /// Scoped release, recording, or work
    pub fn scope_entity_id(&self) -> Option<&str> {
        self.inner.scope_entity_id.as_deref()
    }

    /// Entries in authoring order
    pub fn permissions(&self) -> &[PermissionEntry] {
        &self.inner.permissions
    }

    /// Entry for a permission type
    pub fn entry(&self, permission_type: PermissionType) -> Option<&PermissionEntry> {
        self.inner
            .permissions
            .iter()
            .find(|entry| entry.permission_type == permission_type)
    }

    /// Start of the effective window
    pub fn effective_from(&self) -> DateTime<Utc> {
        self.inner.effective_from
    }

    /// Exclusive end of the effective window
    pub fn effective_until(&self) -> Option<DateTime<Utc>> {
        self.inner.effective_until
    }

    /// Whether `at` falls within `[effective_from, effective_until)`
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.inner.effective_from && self.inner.effective_until.map_or(true, |until| at < until)
    }

    /// Parties authorized to edit
    pub fn delegation_chain(&self) -> &DelegationChain {
        &self.inner.delegation_chain
    }

    /// Decision for permission types without an entry
    pub fn default_permission(&self) -> &PermissionValue {
        &self.inner.default_permission
    }

    /// Published version
    pub fn version(&self) -> u64 {
        self.inner.version
    }

    /// Lineage key
    pub fn key(&self) -> BundleKey {
        self.inner.key()
    }

    /// Editable copy for producing the next version
    pub fn to_draft(&self) -> BundleDraft {
        self.inner.clone()
    }

    /// Resolve a permission type for a requester against this bundle
    pub fn resolve(
        &self,
        permission_type: PermissionType,
        requester_id: &str,
        resolver: &OverrideResolver,
    ) -> ResolvedDecision {
        resolver.resolve(
            self.entry(permission_type),
            requester_id,
            self.default_permission(),
        )
    }
}

impl TryFrom<BundleDraft> for PermissionBundle {
    type Error = EncoreError;

    fn try_from(draft: BundleDraft) -> Result<Self> {
        draft.build()
    }
}

impl From<PermissionBundle> for BundleDraft {
    fn from(bundle: PermissionBundle) -> Self {
        bundle.inner
    }
}
