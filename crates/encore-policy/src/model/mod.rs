//! Policy model
//!
//! Immutable value types for permission entries, conditions, the delegation
//! chain, and the permission bundle as a whole.

pub mod bundle;
pub mod condition;
pub mod delegation;
pub mod entry;
pub mod permission;

pub use bundle::{BundleDraft, BundleKey, BundleScope, PermissionBundle};
pub use condition::{Condition, ConditionRecord, UNLESS_AUTHORIZED_PLATFORM};
pub use delegation::{DelegationChain, DelegationEntry, DelegationRole};
pub use entry::PermissionEntry;
pub use permission::{
    PermissionType, PermissionValue, PermissionValueKind, PermissionValueRecord, RoyaltyRate,
};
