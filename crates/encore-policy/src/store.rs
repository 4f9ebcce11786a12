//! Versioned bundle publication
//!
//! Each bundle lineage keeps every published version. Publishing swaps in a
//! fully built `Arc<PermissionBundle>`; readers holding an older `Arc` keep a
//! complete older version and never see a partially updated bundle.

use crate::model::{BundleDraft, BundleKey, PermissionBundle};
use encore_core::{EncoreError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Store of bundle lineages and their version histories
#[derive(Debug, Default)]
pub struct BundleStore {
    lineages: RwLock<BTreeMap<BundleKey, Vec<Arc<PermissionBundle>>>>,
}

impl BundleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a lineage with its first version
    ///
    /// The draft's version is forced to 1.
    pub fn create(&self, mut draft: BundleDraft) -> Result<Arc<PermissionBundle>> {
        draft.version = 1;
        let bundle = Arc::new(draft.build()?);
        let key = bundle.key();

        let mut lineages = self.lineages.write();
        if lineages.contains_key(&key) {
            return Err(EncoreError::validation(format!(
                "bundle {key} already exists; publish a new version instead"
            )));
        }
        lineages.insert(key.clone(), vec![bundle.clone()]);
        info!(bundle = %key, "created permission bundle");
        Ok(bundle)
    }

    /// Publish the next version of an existing lineage
    ///
    /// `draft.version` must equal the current version the edit was based on;
    /// the published bundle gets the next version number. The actor must hold
    /// `can_modify` in the current delegation chain, and changing the chain
    /// additionally requires `can_delegate`.
    pub fn publish(&self, actor_id: &str, mut draft: BundleDraft) -> Result<Arc<PermissionBundle>> {
        let key = draft.key();
        let mut lineages = self.lineages.write();
        let history = lineages
            .get_mut(&key)
            .ok_or_else(|| EncoreError::not_found(format!("bundle {key}")))?;
        let current = history
            .last()
            .cloned()
            .ok_or_else(|| EncoreError::not_found(format!("bundle {key} has no versions")))?;

        let chain = current.delegation_chain();
        if !chain.authorizes_modify(actor_id) {
            return Err(EncoreError::unauthorized(format!(
                "{actor_id} may not modify bundle {key}"
            )));
        }
        if draft.delegation_chain != *chain && !chain.authorizes_delegate(actor_id) {
            return Err(EncoreError::unauthorized(format!(
                "{actor_id} may not change the delegation chain of {key}"
            )));
        }

        if draft.version != current.version() {
            return Err(EncoreError::validation(format!(
                "draft of {key} is based on version {} but the current version is {}",
                draft.version,
                current.version()
            )));
        }

        draft.version = current.version() + 1;
        let bundle = Arc::new(draft.build()?);
        history.push(bundle.clone());
        info!(bundle = %key, version = bundle.version(), actor = actor_id, "published permission bundle");
        Ok(bundle)
    }

    /// Latest version of a lineage
    pub fn current(&self, key: &BundleKey) -> Option<Arc<PermissionBundle>> {
        self.lineages
            .read()
            .get(key)
            .and_then(|history| history.last().cloned())
    }

    /// A specific version of a lineage
    pub fn version(&self, key: &BundleKey, version: u64) -> Option<Arc<PermissionBundle>> {
        self.lineages.read().get(key).and_then(|history| {
            history
                .iter()
                .find(|bundle| bundle.version() == version)
                .cloned()
        })
    }

    /// Every version of a lineage, oldest first
    pub fn history(&self, key: &BundleKey) -> Vec<Arc<PermissionBundle>> {
        self.lineages.read().get(key).cloned().unwrap_or_default()
    }

    /// Keys of all lineages
    pub fn keys(&self) -> Vec<BundleKey> {
        self.lineages.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DelegationChain, DelegationEntry, DelegationRole, PermissionEntry, PermissionType,
        PermissionValue,
    };
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn draft() -> BundleDraft {
        let chain = DelegationChain::from(vec![
            DelegationEntry::owner("artist-1", "Nova"),
            DelegationEntry::delegate("mgr-1", "Mgmt", DelegationRole::Manager, true, false),
            DelegationEntry::delegate("dist-1", "Distro", DelegationRole::Distributor, false, false),
        ]);
        BundleDraft::new(
            "artist-1",
            PermissionValue::Deny,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .with_delegation_chain(chain)
    }

    #[test]
    fn test_create_and_publish() {
        let store = BundleStore::new();
        let v1 = store.create(draft()).unwrap();
        assert_eq!(v1.version(), 1);

        let mut edit = v1.to_draft();
        edit.upsert_entry(PermissionEntry::new(PermissionType::Stream, PermissionValue::Allow));
        let v2 = store.publish("mgr-1", edit).unwrap();

        assert_eq!(v2.version(), 2);
        assert_eq!(store.current(&v1.key()).unwrap().version(), 2);
        assert_eq!(store.history(&v1.key()).len(), 2);

        // Superseded versions stay queryable and unchanged
        let old = store.version(&v1.key(), 1).unwrap();
        assert!(old.entry(PermissionType::Stream).is_none());
        assert!(v1.entry(PermissionType::Stream).is_none());
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let store = BundleStore::new();
        store.create(draft()).unwrap();
        assert_matches!(store.create(draft()), Err(EncoreError::Validation { .. }));
    }

    #[test]
    fn test_unauthorized_actor_rejected() {
        let store = BundleStore::new();
        let v1 = store.create(draft()).unwrap();

        for actor in ["dist-1", "stranger"] {
            let result = store.publish(actor, v1.to_draft());
            assert_matches!(result, Err(EncoreError::Unauthorized { .. }));
        }
        assert_eq!(store.current(&v1.key()).unwrap().version(), 1);
    }

    #[test]
    fn test_chain_change_requires_delegate_right() {
        let store = BundleStore::new();
        let v1 = store.create(draft()).unwrap();

        let mut edit = v1.to_draft();
        edit.delegation_chain =
            DelegationChain::rooted_at(DelegationEntry::owner("artist-1", "Nova"));
        assert_matches!(
            store.publish("mgr-1", edit.clone()),
            Err(EncoreError::Unauthorized { .. })
        );
        assert!(store.publish("artist-1", edit).is_ok());
    }

    #[test]
    fn test_stale_draft_rejected() {
        let store = BundleStore::new();
        let v1 = store.create(draft()).unwrap();
        store.publish("artist-1", v1.to_draft()).unwrap();

        let stale = v1.to_draft();
        assert_matches!(
            store.publish("artist-1", stale),
            Err(EncoreError::Validation { .. })
        );
    }

    #[test]
    fn test_publish_unknown_lineage() {
        let store = BundleStore::new();
        assert_matches!(
            store.publish("artist-1", draft()),
            Err(EncoreError::NotFound { .. })
        );
    }

    #[test]
    fn test_invalid_edit_leaves_current_version() {
        let store = BundleStore::new();
        let v1 = store.create(draft()).unwrap();

        let mut edit = v1.to_draft();
        edit.permissions.push(PermissionEntry::new(PermissionType::Remix, PermissionValue::Allow));
        edit.permissions.push(PermissionEntry::new(PermissionType::Remix, PermissionValue::Deny));
        assert!(store.publish("artist-1", edit).is_err());
        assert_eq!(store.current(&v1.key()).unwrap().version(), 1);
    }
}
