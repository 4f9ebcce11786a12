//! Audit log entries
//!
//! An entry freezes the inputs of a decision at the moment it was made. Later
//! bundle edits never change what an entry says was decided.

use chrono::{DateTime, Utc};
use encore_core::{EncoreError, Result};
use encore_policy::{BundleScope, PermissionType, PermissionValue, ResolvedDecision};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of party that made a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequesterType {
    /// AI model developer
    AiCompany,
    /// Streaming service
    StreamingPlatform,
    /// Distributor
    Distributor,
    /// Record label
    Label,
    /// Music publisher
    Publisher,
    /// Individual creator
    Creator,
    /// Academic or independent researcher
    Researcher,
    /// Anything else
    Other,
}

impl RequesterType {
    /// Every requester type
    pub const ALL: [RequesterType; 8] = [
        RequesterType::AiCompany,
        RequesterType::StreamingPlatform,
        RequesterType::Distributor,
        RequesterType::Label,
        RequesterType::Publisher,
        RequesterType::Creator,
        RequesterType::Researcher,
        RequesterType::Other,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RequesterType::AiCompany => "ai_company",
            RequesterType::StreamingPlatform => "streaming_platform",
            RequesterType::Distributor => "distributor",
            RequesterType::Label => "label",
            RequesterType::Publisher => "publisher",
            RequesterType::Creator => "creator",
            RequesterType::Researcher => "researcher",
            RequesterType::Other => "other",
        }
    }
}

impl fmt::Display for RequesterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequesterType {
    type Err = EncoreError;

    fn from_str(s: &str) -> Result<Self> {
        RequesterType::ALL
            .iter()
            .copied()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| EncoreError::validation(format!("unknown requester type {s}")))
    }
}

/// Immutable record of one resolved decision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry id
    pub id: Uuid,
    /// Ledger-assigned position, strictly increasing across appends
    pub sequence: u64,
    /// Decision time
    pub timestamp: DateTime<Utc>,
    /// Requester display name at decision time
    pub requester_name: String,
    /// Stable requester identifier matched against override conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<String>,
    /// Kind of requester
    pub requester_type: RequesterType,
    /// Requested use case
    pub permission_type: PermissionType,
    /// Scope of the bundle that decided
    pub scope: BundleScope,
    /// Work the request concerned, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_title: Option<String>,
    /// Resolved decision
    pub result: PermissionValue,
    /// Explanation recorded with the decision
    pub reason: String,
}

impl AuditLogEntry {
    /// Sort key used for display order
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.sequence)
    }
}

/// Entry contents before the ledger assigns a sequence
///
/// `id` and `timestamp` are filled in by the ledger when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDraft {
    /// Caller-chosen id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Caller-chosen decision time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Requester display name
    pub requester_name: String,
    /// Stable requester identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<String>,
    /// Kind of requester
    pub requester_type: RequesterType,
    /// Requested use case
    pub permission_type: PermissionType,
    /// Scope of the bundle that decided
    pub scope: BundleScope,
    /// Work the request concerned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_title: Option<String>,
    /// Resolved decision
    pub result: PermissionValue,
    /// Explanation
    pub reason: String,
}

impl AuditDraft {
    /// Draft with the mandatory fields
    pub fn new(
        requester_name: impl Into<String>,
        requester_type: RequesterType,
        permission_type: PermissionType,
        scope: BundleScope,
        result: PermissionValue,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            timestamp: None,
            requester_name: requester_name.into(),
            requester_id: None,
            requester_type,
            permission_type,
            scope,
            work_title: None,
            result,
            reason: reason.into(),
        }
    }

    /// Draft freezing a resolver decision
    pub fn from_decision(
        requester_name: impl Into<String>,
        requester_type: RequesterType,
        permission_type: PermissionType,
        scope: BundleScope,
        decision: &ResolvedDecision,
    ) -> Self {
        Self::new(
            requester_name,
            requester_type,
            permission_type,
            scope,
            decision.value.clone(),
            decision.reason.clone(),
        )
    }

    /// Use a caller-chosen id
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Use a caller-chosen timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Record the requester identifier
    pub fn with_requester_id(mut self, requester_id: impl Into<String>) -> Self {
        self.requester_id = Some(requester_id.into());
        self
    }

    /// Record the work title
    pub fn with_work_title(mut self, work_title: impl Into<String>) -> Self {
        self.work_title = Some(work_title.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.requester_name.trim().is_empty() {
            return Err(EncoreError::validation(
                "audit entry requester_name must not be empty",
            ));
        }
        if self.reason.trim().is_empty() {
            return Err(EncoreError::validation("audit entry reason must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn seal(self, sequence: u64) -> AuditLogEntry {
        AuditLogEntry {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            sequence,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            requester_name: self.requester_name,
            requester_id: self.requester_id,
            requester_type: self.requester_type,
            permission_type: self.permission_type,
            scope: self.scope,
            work_title: self.work_title,
            result: self.result,
            reason: self.reason,
        }
    }
}
