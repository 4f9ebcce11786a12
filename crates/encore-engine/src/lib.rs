//! # Encore Engine
//!
//! Consent engine for a rights holder's catalog. Wires the bundle store,
//! override resolver, and audit ledger together so that every resolved request
//! is recorded, and exposes the propagation graph over what was recorded.
//!
//! ```rust
//! use encore_engine::{ConsentEngine, ResolutionRequest};
//! use encore_ledger::RequesterType;
//! use encore_policy::{BundleDraft, PermissionEntry, PermissionType, PermissionValue};
//!
//! let engine = ConsentEngine::in_memory();
//! let bundle = engine
//!     .store()
//!     .create(
//!         BundleDraft::new("artist-1", PermissionValue::Ask, chrono::Utc::now())
//!             .with_entry(PermissionEntry::new(PermissionType::Stream, PermissionValue::Allow)),
//!     )
//!     .unwrap();
//!
//! let request = ResolutionRequest::new(
//!     "spotify",
//!     "Spotify",
//!     RequesterType::StreamingPlatform,
//!     PermissionType::Stream,
//! );
//! let decision = engine.decide(&bundle.key(), &request).unwrap();
//! assert_eq!(decision.decision.value, PermissionValue::Allow);
//! assert_eq!(engine.ledger().len(), 1);
//! ```

pub mod bundle_file;
pub mod config;
pub mod engine;

pub use bundle_file::load_bundle;
pub use config::EngineConfig;
pub use engine::{ConsentEngine, Decision, ResolutionRequest};
