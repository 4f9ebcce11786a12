//! # Encore Core
//!
//! Shared foundations for the Encore consent policy engine: the unified error
//! type, layered configuration traits, and the read-only platform registry
//! consulted when enriching decisions and graph labels.

pub mod config;
pub mod errors;
pub mod registry;

pub use config::{EncoreConfig, ENV_PREFIX};
pub use errors::{EncoreError, Result};
pub use registry::{EmptyRegistry, PlatformInfo, PlatformRegistry, StaticRegistry};
