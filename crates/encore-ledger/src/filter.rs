//! Ledger query filters

use crate::entry::{AuditLogEntry, RequesterType};
use chrono::{DateTime, Utc};
use encore_policy::PermissionType;
use serde::{Deserialize, Serialize};

/// Conjunctive filter over audit entries
///
/// Unset fields match everything. The time range is `[since, until)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Only this requester type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_type: Option<RequesterType>,
    /// Only this permission type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_type: Option<PermissionType>,
    /// Only this exact requester name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<String>,
    /// Entries at or after this time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Entries strictly before this time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Filter matching every entry
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a requester type
    pub fn requester_type(mut self, requester_type: RequesterType) -> Self {
        self.requester_type = Some(requester_type);
        self
    }

    /// Restrict to a permission type
    pub fn permission_type(mut self, permission_type: PermissionType) -> Self {
        self.permission_type = Some(permission_type);
        self
    }

    /// Restrict to an exact requester name
    pub fn requester_name(mut self, name: impl Into<String>) -> Self {
        self.requester_name = Some(name.into());
        self
    }

    /// Lower time bound, inclusive
    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    /// Upper time bound, exclusive
    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    /// Whether `entry` passes every set criterion
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.requester_type.map_or(true, |rt| entry.requester_type == rt)
            && self
                .permission_type
                .map_or(true, |pt| entry.permission_type == pt)
            && self
                .requester_name
                .as_deref()
                .map_or(true, |name| entry.requester_name == name)
            && self.since.map_or(true, |since| entry.timestamp >= since)
            && self.until.map_or(true, |until| entry.timestamp < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditDraft;
    use chrono::{Duration, TimeZone};
    use encore_policy::{BundleScope, PermissionValue};

    fn entry_at(at: DateTime<Utc>) -> AuditLogEntry {
        AuditDraft::new(
            "Spotify",
            RequesterType::StreamingPlatform,
            PermissionType::Stream,
            BundleScope::Catalog,
            PermissionValue::Allow,
            "base policy applied",
        )
        .with_timestamp(at)
        .seal(1)
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let entry = entry_at(Utc::now());
        assert!(AuditFilter::all().matches(&entry));
    }

    #[test]
    fn test_field_filters() {
        let entry = entry_at(Utc::now());
        assert!(AuditFilter::all()
            .requester_type(RequesterType::StreamingPlatform)
            .permission_type(PermissionType::Stream)
            .requester_name("Spotify")
            .matches(&entry));
        assert!(!AuditFilter::all()
            .requester_type(RequesterType::AiCompany)
            .matches(&entry));
        assert!(!AuditFilter::all()
            .permission_type(PermissionType::Download)
            .matches(&entry));
        assert!(!AuditFilter::all().requester_name("spotify").matches(&entry));
    }

    #[test]
    fn test_time_range_is_half_open() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let entry = entry_at(at);

        assert!(AuditFilter::all().since(at).matches(&entry));
        assert!(!AuditFilter::all().until(at).matches(&entry));
        assert!(AuditFilter::all()
            .since(at - Duration::hours(1))
            .until(at + Duration::seconds(1))
            .matches(&entry));
        assert!(!AuditFilter::all()
            .since(at + Duration::seconds(1))
            .matches(&entry));
    }
}
