//! Delegation chain for bundle editing
//!
//! The chain records, root to leaf, which parties may edit a bundle or hand
//! that authority on. It plays no part in request-time resolution.

use encore_core::{EncoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role a party holds over a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationRole {
    /// The rights holder
    Owner,
    /// Artist or catalog manager
    Manager,
    /// Record label
    Label,
    /// Distributor
    Distributor,
}

impl fmt::Display for DelegationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DelegationRole::Owner => "owner",
            DelegationRole::Manager => "manager",
            DelegationRole::Label => "label",
            DelegationRole::Distributor => "distributor",
        };
        f.write_str(name)
    }
}

/// One link in a delegation chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationEntry {
    /// Identifier of the delegated party
    pub entity_id: String,
    /// Display name of the delegated party
    pub entity_name: String,
    /// Role held over the bundle
    pub role: DelegationRole,
    /// May publish new bundle versions
    pub can_modify: bool,
    /// May extend the chain
    pub can_delegate: bool,
}

impl DelegationEntry {
    /// Root link for the owning entity, with full authority
    pub fn owner(entity_id: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            role: DelegationRole::Owner,
            can_modify: true,
            can_delegate: true,
        }
    }

    /// Link for a delegated party
    pub fn delegate(
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
        role: DelegationRole,
        can_modify: bool,
        can_delegate: bool,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            role,
            can_modify,
            can_delegate,
        }
    }
}

/// Ordered root-to-leaf delegation chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelegationChain(Vec<DelegationEntry>);

impl DelegationChain {
    /// Chain rooted at the owning entity
    pub fn rooted_at(owner: DelegationEntry) -> Self {
        Self(vec![owner])
    }

    /// Links in root-to-leaf order
    pub fn links(&self) -> &[DelegationEntry] {
        &self.0
    }

    /// Root link, if any
    pub fn root(&self) -> Option<&DelegationEntry> {
        self.0.first()
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain has no links
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Link for an entity
    pub fn find(&self, entity_id: &str) -> Option<&DelegationEntry> {
        self.0.iter().find(|link| link.entity_id == entity_id)
    }

    /// Whether the entity may publish new versions
    pub fn authorizes_modify(&self, entity_id: &str) -> bool {
        self.find(entity_id).is_some_and(|link| link.can_modify)
    }

    /// Whether the entity may extend the chain
    pub fn authorizes_delegate(&self, entity_id: &str) -> bool {
        self.find(entity_id).is_some_and(|link| link.can_delegate)
    }

    /// Return a new chain with `delegatee` appended under `delegator`
    ///
    /// The delegator must hold `can_delegate`, and the delegatee cannot be
    /// granted a right the delegator lacks.
    pub fn extend(&self, delegator_id: &str, delegatee: DelegationEntry) -> Result<Self> {
        let delegator = self.find(delegator_id).ok_or_else(|| {
            EncoreError::unauthorized(format!("{delegator_id} is not in the delegation chain"))
        })?;

        if !delegator.can_delegate {
            return Err(EncoreError::unauthorized(format!(
                "{delegator_id} may not delegate"
            )));
        }

        if delegatee.can_modify && !delegator.can_modify {
            return Err(EncoreError::unauthorized(format!(
                "{delegator_id} cannot grant modify rights it does not hold"
            )));
        }

        let mut links = self.0.clone();
        links.push(delegatee);
        let chain = Self(links);
        chain.verify_links()?;
        Ok(chain)
    }

    /// Verify the chain against the bundle's owning entity
    pub fn verify(&self, bundle_entity_id: &str) -> Result<()> {
        if let Some(root) = self.root() {
            if root.role != DelegationRole::Owner {
                return Err(EncoreError::validation(format!(
                    "delegation chain root must be the owner, found {}",
                    root.role
                )));
            }
            if root.entity_id != bundle_entity_id {
                return Err(EncoreError::validation(format!(
                    "delegation chain root {} does not own bundle entity {bundle_entity_id}",
                    root.entity_id
                )));
            }
        }
        self.verify_links()
    }

    fn verify_links(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (position, link) in self.0.iter().enumerate() {
            if link.entity_id.trim().is_empty() {
                return Err(EncoreError::validation(
                    "delegation entry has an empty entity id",
                ));
            }
            if !seen.insert(link.entity_id.as_str()) {
                return Err(EncoreError::validation(format!(
                    "{} appears more than once in the delegation chain",
                    link.entity_id
                )));
            }
            if position > 0 && link.role == DelegationRole::Owner {
                return Err(EncoreError::validation(format!(
                    "{} holds the owner role below the chain root",
                    link.entity_id
                )));
            }
        }
        Ok(())
    }
}

impl From<Vec<DelegationEntry>> for DelegationChain {
    fn from(links: Vec<DelegationEntry>) -> Self {
        Self(links)
    }
}
