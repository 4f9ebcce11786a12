//! Consent engine
//!
//! Resolves requests against the current bundle version and records every
//! decision in the audit ledger. Resolution itself stays pure; the engine owns
//! the side effect of appending.

use crate::config::{EngineConfig, DEFAULT_APPEND_RETRIES};
use chrono::{DateTime, Utc};
use encore_core::{EncoreError, PlatformRegistry, Result};
use encore_graph::{latest_results, Graph, GraphBuilder, LatestResult};
use encore_ledger::{
    AuditDraft, AuditFilter, AuditLedger, AuditLogEntry, JsonLinesLedger, MemoryLedger,
    RequesterType,
};
use encore_policy::{
    BundleKey, BundleStore, OverrideResolver, PermissionBundle, PermissionType, ResolvedDecision,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One request to use the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    /// Stable requester identifier, matched against override conditions
    pub requester_id: String,
    /// Requester display name, recorded in the ledger
    pub requester_name: String,
    /// Kind of requester
    pub requester_type: RequesterType,
    /// Requested use case
    pub permission_type: PermissionType,
    /// Work the request concerns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_title: Option<String>,
}

impl ResolutionRequest {
    /// Request for a known permission type
    pub fn new(
        requester_id: impl Into<String>,
        requester_name: impl Into<String>,
        requester_type: RequesterType,
        permission_type: PermissionType,
    ) -> Self {
        Self {
            requester_id: requester_id.into(),
            requester_name: requester_name.into(),
            requester_type,
            permission_type,
            work_title: None,
        }
    }

    /// Request naming its permission type as text
    ///
    /// Fails with [`EncoreError::UnknownPermissionType`] for names outside
    /// the enumeration.
    pub fn parse(
        requester_id: impl Into<String>,
        requester_name: impl Into<String>,
        requester_type: RequesterType,
        permission_type: &str,
    ) -> Result<Self> {
        let permission_type = permission_type.trim().parse::<PermissionType>()?;
        Ok(Self::new(
            requester_id,
            requester_name,
            requester_type,
            permission_type,
        ))
    }

    /// Attach the work title
    pub fn with_work_title(mut self, work_title: impl Into<String>) -> Self {
        self.work_title = Some(work_title.into());
        self
    }
}

/// Decision together with the ledger entry that recorded it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Resolved decision
    pub decision: ResolvedDecision,
    /// Bundle version the decision was made against
    pub bundle_version: u64,
    /// Ledger entry
    pub entry: AuditLogEntry,
}

/// Bundle store, resolver, and ledger wired together
pub struct ConsentEngine {
    store: Arc<BundleStore>,
    ledger: Arc<dyn AuditLedger>,
    resolver: OverrideResolver,
    append_retries: u32,
}

impl ConsentEngine {
    /// Engine over explicit parts
    pub fn new(
        store: Arc<BundleStore>,
        ledger: Arc<dyn AuditLedger>,
        resolver: OverrideResolver,
    ) -> Self {
        Self {
            store,
            ledger,
            resolver,
            append_retries: DEFAULT_APPEND_RETRIES,
        }
    }

    /// Engine with an empty store, an in-memory ledger, and default terms
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(BundleStore::new()),
            Arc::new(MemoryLedger::new()),
            OverrideResolver::default(),
        )
    }

    /// Engine built from configuration
    ///
    /// Opens the JSON-lines ledger when `ledger_path` is set.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let ledger: Arc<dyn AuditLedger> = match &config.ledger_path {
            Some(path) => {
                Arc::new(JsonLinesLedger::open(path)?.with_sync_writes(config.sync_writes))
            }
            None => Arc::new(MemoryLedger::new()),
        };
        let resolver = OverrideResolver::new(
            Arc::new(config.override_terms()),
            Arc::new(config.registry()),
        );
        info!(
            persistent = config.ledger_path.is_some(),
            platforms = config.platforms.len(),
            "consent engine ready"
        );
        Ok(Self::new(Arc::new(BundleStore::new()), ledger, resolver)
            .with_append_retries(config.append_retries))
    }

    /// Attempts per append before an append conflict is returned
    pub fn with_append_retries(mut self, append_retries: u32) -> Self {
        self.append_retries = append_retries.max(1);
        self
    }

    /// Bundle store
    pub fn store(&self) -> &Arc<BundleStore> {
        &self.store
    }

    /// Audit ledger
    pub fn ledger(&self) -> &Arc<dyn AuditLedger> {
        &self.ledger
    }

    /// Override resolver
    pub fn resolver(&self) -> &OverrideResolver {
        &self.resolver
    }

    /// Platform registry
    pub fn registry(&self) -> &Arc<dyn PlatformRegistry> {
        self.resolver.registry()
    }

    /// Resolve against the current version of a stored bundle and record it
    pub fn decide(&self, key: &BundleKey, request: &ResolutionRequest) -> Result<Decision> {
        let bundle = self
            .store
            .current(key)
            .ok_or_else(|| EncoreError::not_found(format!("bundle {key}")))?;
        self.decide_with(&bundle, request)
    }

    /// Resolve against a given bundle and record it
    pub fn decide_with(
        &self,
        bundle: &PermissionBundle,
        request: &ResolutionRequest,
    ) -> Result<Decision> {
        let decision = bundle.resolve(
            request.permission_type,
            &request.requester_id,
            &self.resolver,
        );

        let mut draft = AuditDraft::from_decision(
            request.requester_name.clone(),
            request.requester_type,
            request.permission_type,
            bundle.scope(),
            &decision,
        )
        .with_requester_id(request.requester_id.clone());
        draft.work_title = request.work_title.clone();

        let entry = self.append_with_retry(draft)?;
        debug!(
            bundle = %bundle.key(),
            version = bundle.version(),
            permission_type = %request.permission_type,
            requester = %request.requester_name,
            value = %decision.value,
            "recorded decision"
        );
        Ok(Decision {
            decision,
            bundle_version: bundle.version(),
            entry,
        })
    }

    fn append_with_retry(&self, draft: AuditDraft) -> Result<AuditLogEntry> {
        let mut attempt = 1;
        loop {
            match self.ledger.append(draft.clone()) {
                Ok(entry) => return Ok(entry),
                Err(err) if err.is_retryable() && attempt < self.append_retries => {
                    warn!(attempt, error = %err, "audit append conflicted, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Ledger entries matching `filter`
    pub fn audit_log(&self, filter: &AuditFilter) -> Vec<AuditLogEntry> {
        self.ledger.query(filter).to_vec()
    }

    /// Propagation graph over the entries matching `filter`
    pub fn graph(&self, filter: &AuditFilter) -> Graph {
        let query = self.ledger.query(filter);
        GraphBuilder::new()
            .with_registry(self.registry().clone())
            .build(&query)
    }

    /// Latest decision per requester and category
    pub fn latest_results(&self) -> Vec<LatestResult> {
        latest_results(&self.ledger.query(&AuditFilter::all()))
    }

    /// Entries recorded in `[since, until)`
    pub fn decisions_between(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<AuditLogEntry> {
        self.audit_log(&AuditFilter::all().since(since).until(until))
    }
}

impl std::fmt::Debug for ConsentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentEngine")
            .field("bundles", &self.store.keys().len())
            .field("ledger_entries", &self.ledger.len())
            .field("append_retries", &self.append_retries)
            .finish()
    }
}
