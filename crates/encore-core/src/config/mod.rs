//! Configuration loading for Encore components

pub mod traits;

pub use traits::{parse_bool, EncoreConfig, ENV_PREFIX};
