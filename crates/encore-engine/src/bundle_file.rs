//! Bundle files on disk

use encore_core::{EncoreError, Result};
use encore_policy::PermissionBundle;
use std::path::Path;

/// Load and validate a bundle, choosing TOML or JSON by extension
pub fn load_bundle(path: &Path) -> Result<PermissionBundle> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => PermissionBundle::from_toml_str(&content),
        Some("json") => PermissionBundle::from_json_str(&content),
        _ => Err(EncoreError::validation(format!(
            "unsupported bundle format: {}",
            path.display()
        ))),
    }
}
