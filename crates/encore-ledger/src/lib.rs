//! # Encore Ledger
//!
//! Append-only audit trail of resolved consent decisions.
//!
//! - [`AuditLedger`]: append and query contract, with conditional append for
//!   callers that detect write races
//! - [`MemoryLedger`]: in-process ledger
//! - [`JsonLinesLedger`]: ledger persisted as one JSON object per line
//! - [`AuditFilter`]: query criteria by requester, permission type, and time

pub mod entry;
pub mod filter;
pub mod jsonl;
pub mod ledger;
pub mod memory;

pub use entry::{AuditDraft, AuditLogEntry, RequesterType};
pub use filter::AuditFilter;
pub use jsonl::JsonLinesLedger;
pub use ledger::{AuditLedger, LedgerQuery, QueryIter};
pub use memory::MemoryLedger;
