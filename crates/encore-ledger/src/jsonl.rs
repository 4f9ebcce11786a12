//! JSON-lines file ledger
//!
//! One entry per line in append order. The file is replayed on open; an entry
//! becomes visible to queries only after its line has been written and
//! flushed.
//!
//! Writers serialize on the file lock and take the state write lock only to
//! publish a written entry, so queries never wait on disk I/O. A failed write
//! is truncated away before the error is returned, and an unterminated last
//! line left by a crash is dropped on open.

use crate::entry::{AuditDraft, AuditLogEntry};
use crate::filter::AuditFilter;
use crate::ledger::{AuditLedger, LedgerQuery, LedgerState};
use encore_core::{EncoreError, Result};
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Audit ledger persisted as an append-only JSON-lines file
#[derive(Debug)]
pub struct JsonLinesLedger {
    path: PathBuf,
    sync_writes: bool,
    state: RwLock<LedgerState>,
    file: Mutex<LedgerFile>,
}

/// Write side of the ledger file
#[derive(Debug)]
struct LedgerFile {
    file: File,
    /// A failed append could not be truncated away
    torn: bool,
    #[cfg(test)]
    fail_after: Option<usize>,
}

impl LedgerFile {
    fn new(file: File) -> Self {
        Self {
            file,
            torn: false,
            #[cfg(test)]
            fail_after: None,
        }
    }

    /// Append one record, leaving the file unchanged on failure
    fn append(&mut self, record: &[u8], sync: bool) -> Result<()> {
        if self.torn {
            return Err(EncoreError::storage(
                "ledger file holds a partial write; reopen the ledger to recover",
            ));
        }

        let start = self.file.metadata()?.len();
        if let Err(err) = self.write_record(record, sync) {
            if let Err(rollback) = self.file.set_len(start) {
                self.torn = true;
                warn!(error = %rollback, offset = start, "could not truncate partial ledger write");
            }
            return Err(EncoreError::storage(format!("ledger append failed: {err}")));
        }
        Ok(())
    }

    fn write_record(&mut self, record: &[u8], sync: bool) -> io::Result<()> {
        if let Some(result) = self.injected_failure(record) {
            return result;
        }
        self.file.write_all(record)?;
        self.file.flush()?;
        if sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn injected_failure(&mut self, record: &[u8]) -> Option<io::Result<()>> {
        let limit = self.fail_after.take()?;
        Some(
            self.file
                .write_all(&record[..limit.min(record.len())])
                .and_then(|()| Err(io::Error::new(io::ErrorKind::Other, "injected write failure"))),
        )
    }

    #[cfg(not(test))]
    fn injected_failure(&mut self, _record: &[u8]) -> Option<io::Result<()>> {
        None
    }
}

impl JsonLinesLedger {
    /// Open or create the ledger file at `path`, replaying existing entries
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| EncoreError::storage(format!("open {}: {e}", path.display())))?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        let (state, valid_len) = replay(&path, &contents)?;
        if valid_len < contents.len() {
            warn!(
                path = %path.display(),
                dropped_bytes = contents.len() - valid_len,
                "dropping unterminated last ledger line"
            );
            file.set_len(valid_len as u64)?;
        }

        info!(path = %path.display(), entries = state.len(), "opened audit ledger");
        Ok(Self {
            path,
            sync_writes: false,
            state: RwLock::new(state),
            file: Mutex::new(LedgerFile::new(file)),
        })
    }

    /// Call `sync_data` after every append
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Location of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_locked(
        &self,
        draft: AuditDraft,
        expected_head: Option<u64>,
    ) -> Result<AuditLogEntry> {
        // Holding the file lock keeps the head fixed until commit
        let mut file = self.file.lock();
        let entry = {
            let state = self.state.read();
            if let Some(expected) = expected_head {
                state.check_head(expected)?;
            }
            state.seal(draft)?
        };

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        file.append(line.as_bytes(), self.sync_writes)?;

        self.state.write().commit(entry.clone());
        drop(file);

        debug!(
            sequence = entry.sequence,
            requester = %entry.requester_name,
            permission_type = %entry.permission_type,
            "persisted audit entry"
        );
        Ok(entry)
    }
}

/// Rebuild state from file contents
///
/// Returns the state and the length of the prefix made of complete lines. Only
/// an unterminated last line may fail to parse; anything else is corruption.
fn replay(path: &Path, contents: &[u8]) -> Result<(LedgerState, usize)> {
    let mut state = LedgerState::default();
    let mut offset = 0;
    for (index, line) in contents.split_inclusive(|b| *b == b'\n').enumerate() {
        let terminated = line.ends_with(b"\n");
        let body = line.strip_suffix(b"\n").unwrap_or(line);
        if body.iter().all(u8::is_ascii_whitespace) {
            offset += line.len();
            continue;
        }
        match serde_json::from_slice::<AuditLogEntry>(body) {
            Ok(entry) => state.restore(entry)?,
            Err(_) if !terminated => break,
            Err(e) => {
                return Err(EncoreError::storage(format!(
                    "{} line {}: {e}",
                    path.display(),
                    index + 1
                )))
            }
        }
        offset += line.len();
    }
    Ok((state, offset))
}

impl AuditLedger for JsonLinesLedger {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::RequesterType;
    use assert_matches::assert_matches;
    use encore_policy::{BundleScope, PermissionType, PermissionValue};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn draft(name: &str) -> AuditDraft {
        AuditDraft::new(
            name,
            RequesterType::StreamingPlatform,
            PermissionType::Download,
            BundleScope::Catalog,
            PermissionValue::with_royalty(0.15).unwrap(),
            "base policy applied",
        )
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("ledger.jsonl");

        let written = {
            let ledger = JsonLinesLedger::open(&path).unwrap();
            let a = ledger.append(draft("Bandcamp")).unwrap();
            let b = ledger.append(draft("Qobuz")).unwrap();
            vec![a, b]
        };

        let ledger = JsonLinesLedger::open(&path).unwrap();
        assert_eq!(ledger.query(&AuditFilter::all()).to_vec(), written);
        assert_eq!(ledger.head(), 2);

        let c = ledger.append(draft("Tidal")).unwrap();
        assert_eq!(c.sequence, 3);
    }

    #[test]
    fn test_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = JsonLinesLedger::open(&path).unwrap().with_sync_writes(true);
        ledger.append(draft("Bandcamp")).unwrap();
        ledger.append(draft("Qobuz")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().all(|l| l.contains("\"ALLOW_WITH_ROYALTY\"")));
    }

    #[test]
    fn test_corrupt_line_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        fs::write(&path, "{not json}\n").unwrap();

        assert_matches!(
            JsonLinesLedger::open(&path),
            Err(EncoreError::Storage { message }) if message.contains("line 1")
        );
    }

    #[test]
    fn test_failed_write_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = JsonLinesLedger::open(&path).unwrap();
        ledger.append(draft("Bandcamp")).unwrap();
        let before = fs::read(&path).unwrap();

        ledger.file.lock().fail_after = Some(40);
        assert_matches!(
            ledger.append(draft("Qobuz")),
            Err(EncoreError::Storage { .. })
        );
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(ledger.len(), 1);

        // The sequence is not consumed by the failed write
        let next = ledger.append(draft("Tidal")).unwrap();
        assert_eq!(next.sequence, 2);
        drop(ledger);

        let reopened = JsonLinesLedger::open(&path).unwrap();
        let names: Vec<_> = reopened
            .query(&AuditFilter::all())
            .iter()
            .map(|e| e.requester_name.clone())
            .collect();
        assert_eq!(names, ["Bandcamp", "Tidal"]);
    }

    #[test]
    fn test_unterminated_tail_dropped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        {
            let ledger = JsonLinesLedger::open(&path).unwrap();
            ledger.append(draft("Bandcamp")).unwrap();
            ledger.append(draft("Qobuz")).unwrap();
        }
        let intact = fs::read(&path).unwrap();
        let mut torn = intact.clone();
        torn.extend_from_slice(br#"{"id":"5f0c","sequence":3,"timest"#);
        fs::write(&path, &torn).unwrap();

        let ledger = JsonLinesLedger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(fs::read(&path).unwrap(), intact);

        let next = ledger.append(draft("Tidal")).unwrap();
        assert_eq!(next.sequence, 3);
        drop(ledger);
        assert_eq!(JsonLinesLedger::open(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_queries_do_not_wait_on_writer_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = Arc::new(JsonLinesLedger::open(&path).unwrap());
        ledger.append(draft("Bandcamp")).unwrap();

        // A writer parked on the file lock stands in for one blocked in I/O
        let guard = ledger.file.lock();
        let writer = {
            let ledger = ledger.clone();
            thread::spawn(move || ledger.append(draft("Qobuz")).map(|e| e.sequence))
        };
        thread::sleep(Duration::from_millis(50));

        assert_eq!(ledger.query(&AuditFilter::all()).count(), 1);
        assert_eq!(ledger.head(), 1);
        assert_eq!(ledger.len(), 1);

        drop(guard);
        assert_eq!(writer.join().unwrap().unwrap(), 2);
        assert_eq!(ledger.len(), 2);
    }
}
