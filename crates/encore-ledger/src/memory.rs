//! In-memory audit ledger

use crate::entry::{AuditDraft, AuditLogEntry};
use crate::filter::AuditFilter;
use crate::ledger::{AuditLedger, LedgerQuery, LedgerState};
use encore_core::Result;
use parking_lot::RwLock;
use tracing::debug;

/// Audit ledger held in process memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    fn append_locked(
        &self,
        draft: AuditDraft,
        expected_head: Option<u64>,
    ) -> Result<AuditLogEntry> {
        let mut state = self.state.write();
        if let Some(expected) = expected_head {
            state.check_head(expected)?;
        }
        let entry = state.seal(draft)?;
        state.commit(entry.clone());
        debug!(
            sequence = entry.sequence,
            requester = %entry.requester_name,
            permission_type = %entry.permission_type,
            "appended audit entry"
        );
        Ok(entry)
    }
}

impl AuditLedger for MemoryLedger {
    fn append(&self, draft: AuditDraft) -> Result<AuditLogEntry> {
        self.append_locked(draft, None)
    }

    fn append_if_head(&self, draft: AuditDraft, expected_head: u64) -> Result<AuditLogEntry> {
        self.append_locked(draft, Some(expected_head))
    }

    fn query(&self, filter: &AuditFilter) -> LedgerQuery {
        LedgerQuery::new(self.state.read().snapshot(), filter.clone())
    }

    fn head(&self) -> u64 {
        self.state.read().head()
    }

    fn len(&self) -> usize {
        self.state.read().len()
    }
}
