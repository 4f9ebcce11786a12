// Bundle validation

use encore_engine::load_bundle;
use std::path::Path;

/// Load a bundle file and report whether it is valid
pub fn run(path: &Path) -> anyhow::Result<()> {
    let bundle = load_bundle(path)?;
    println!(
        "{}: valid {} bundle for {} (version {}, {} entries)",
        path.display(),
        bundle.scope(),
        bundle.entity_id(),
        bundle.version(),
        bundle.permissions().len()
    );
    for entry in bundle.permissions() {
        for condition in entry.opaque_conditions() {
            println!(
                "  note: {} carries unrecognized condition {condition}",
                entry.permission_type
            );
        }
    }
    Ok(())
}
