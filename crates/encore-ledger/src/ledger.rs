//! Ledger contract and shared append state

use crate::entry::{AuditDraft, AuditLogEntry};
use crate::filter::AuditFilter;
use encore_core::{EncoreError, Result};
use std::collections::HashSet;
use std::slice;
use std::sync::Arc;
use uuid::Uuid;

/// Append-only store of audit entries
///
/// Appending is the only mutation. Implementations serialize appends so that
/// every entry gets a unique, gap-free sequence number, and a query sees each
/// entry either in full or not at all.
pub trait AuditLedger: Send + Sync {
    /// Append an entry, assigning id and timestamp when the draft has none
    fn append(&self, draft: AuditDraft) -> Result<AuditLogEntry>;

    /// Append only if the ledger head still equals `expected_head`
    ///
    /// Fails with [`EncoreError::AppendConflict`] when another writer advanced
    /// the head first.
    fn append_if_head(&self, draft: AuditDraft, expected_head: u64) -> Result<AuditLogEntry>;

    /// Snapshot of the entries matching `filter`, ordered by timestamp
    fn query(&self, filter: &AuditFilter) -> LedgerQuery;

    /// Sequence number of the latest append, 0 when empty
    fn head(&self) -> u64;

    /// Number of entries
    fn len(&self) -> usize;

    /// Whether the ledger has no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a ledger query
///
/// Holds a snapshot taken at query time, so it can be iterated any number of
/// times and never observes later appends.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    snapshot: Arc<Vec<Arc<AuditLogEntry>>>,
    filter: AuditFilter,
}

impl LedgerQuery {
    pub(crate) fn new(snapshot: Arc<Vec<Arc<AuditLogEntry>>>, filter: AuditFilter) -> Self {
        Self { snapshot, filter }
    }

    /// Iterate the matching entries in `(timestamp, sequence)` order
    pub fn iter(&self) -> QueryIter<'_> {
        QueryIter {
            inner: self.snapshot.iter(),
            filter: &self.filter,
        }
    }

    /// Number of matching entries
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Matching entries as shared handles
    pub fn shared(&self) -> Vec<Arc<AuditLogEntry>> {
        self.snapshot
            .iter()
            .filter(|entry| self.filter.matches(entry))
            .cloned()
            .collect()
    }

    /// Matching entries as owned values
    pub fn to_vec(&self) -> Vec<AuditLogEntry> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a LedgerQuery {
    type Item = &'a AuditLogEntry;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`LedgerQuery`]
#[derive(Debug, Clone)]
pub struct QueryIter<'a> {
    inner: slice::Iter<'a, Arc<AuditLogEntry>>,
    filter: &'a AuditFilter,
}

impl<'a> Iterator for QueryIter<'a> {
    type Item = &'a AuditLogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.filter;
        self.inner
            .find(|entry| filter.matches(entry))
            .map(|entry| entry.as_ref())
    }
}

/// Entries and sequence head shared by the ledger implementations
///
/// Callers hold the owning lock for writing across `seal` and `commit`.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    entries: Arc<Vec<Arc<AuditLogEntry>>>,
    ids: HashSet<Uuid>,
    head: u64,
}

impl LedgerState {
    pub(crate) fn head(&self) -> u64 {
        self.head
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<AuditLogEntry>>> {
        self.entries.clone()
    }

    pub(crate) fn check_head(&self, expected_head: u64) -> Result<()> {
        if self.head != expected_head {
            return Err(EncoreError::append_conflict(format!(
                "ledger head moved from {expected_head} to {}",
                self.head
            )));
        }
        Ok(())
    }

    /// Turn a draft into the next entry without recording it
    pub(crate) fn seal(&self, draft: AuditDraft) -> Result<AuditLogEntry> {
        draft.validate()?;
        let entry = draft.seal(self.head + 1);
        if self.ids.contains(&entry.id) {
            return Err(EncoreError::append_conflict(format!(
                "audit entry {} already exists",
                entry.id
            )));
        }
        Ok(entry)
    }

    /// Record a sealed entry
    pub(crate) fn commit(&mut self, entry: AuditLogEntry) {
        let key = entry.order_key();
        self.head = self.head.max(entry.sequence);
        self.ids.insert(entry.id);

        // Copies only while a query snapshot is still alive
        let entries = Arc::make_mut(&mut self.entries);
        let position = entries.partition_point(|existing| existing.order_key() <= key);
        entries.insert(position, Arc::new(entry));
    }

    /// Record an entry read back from storage
    pub(crate) fn restore(&mut self, entry: AuditLogEntry) -> Result<()> {
        if entry.sequence <= self.head {
            return Err(EncoreError::storage(format!(
                "audit entry {} has sequence {} at or below head {}",
                entry.id, entry.sequence, self.head
            )));
        }
        if self.ids.contains(&entry.id) {
            return Err(EncoreError::storage(format!(
                "audit entry {} appears twice",
                entry.id
            )));
        }
        self.commit(entry);
        Ok(())
    }
}
