//! # Encore Policy
//!
//! Consent policy for a rights holder's catalog.
//!
//! - [`model`]: permission types and values, conditions, entries, the
//!   delegation chain, and validated permission bundles
//! - [`classifier`]: permission type to consent category mapping
//! - [`resolver`]: effective decision for a requester, applying
//!   authorized-platform overrides before the base value and bundle default
//! - [`store`]: versioned bundle publication with delegation-authorized edits
//!
//! ```rust
//! use encore_policy::model::{BundleDraft, Condition, PermissionEntry, PermissionType, PermissionValue};
//! use encore_policy::OverrideResolver;
//! use chrono::{TimeZone, Utc};
//!
//! let bundle = BundleDraft::new("artist-1", PermissionValue::Ask, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
//!     .with_entry(
//!         PermissionEntry::new(PermissionType::VoiceCloning, PermissionValue::Deny)
//!             .with_condition(Condition::authorized_platform("platform-x")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let resolver = OverrideResolver::default();
//! assert!(bundle.resolve(PermissionType::VoiceCloning, "platform-x", &resolver).is_override());
//! assert_eq!(bundle.resolve(PermissionType::VoiceCloning, "platform-y", &resolver).value, PermissionValue::Deny);
//! assert_eq!(bundle.resolve(PermissionType::Remix, "platform-y", &resolver).value, PermissionValue::Ask);
//! ```

pub mod classifier;
pub mod model;
pub mod resolver;
pub mod store;

pub use classifier::{classify, CategoryId, UNCLASSIFIED};
pub use model::{
    BundleDraft, BundleKey, BundleScope, Condition, DelegationChain, DelegationEntry,
    DelegationRole, PermissionBundle, PermissionEntry, PermissionType, PermissionValue,
    PermissionValueKind, RoyaltyRate,
};
pub use resolver::{
    DecisionBasis, OverrideResolver, OverrideTerms, ResolvedDecision, TermsTable, UniformOverride,
};
pub use store::BundleStore;
