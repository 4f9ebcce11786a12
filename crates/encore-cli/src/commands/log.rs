// Ledger listing

use super::open_engine;
use encore_engine::EngineConfig;
use encore_ledger::{AuditFilter, RequesterType};
use encore_policy::PermissionType;

/// Print matching ledger entries, one JSON object per line
pub fn run(
    config: &EngineConfig,
    permission: Option<&str>,
    requester_type: Option<RequesterType>,
) -> anyhow::Result<()> {
    let mut filter = AuditFilter::all();
    if let Some(permission) = permission {
        filter = filter.permission_type(permission.trim().parse::<PermissionType>()?);
    }
    if let Some(requester_type) = requester_type {
        filter = filter.requester_type(requester_type);
    }

    let engine = open_engine(config)?;
    for entry in engine.ledger().query(&filter).iter() {
        println!("{}", serde_json::to_string(entry)?);
    }
    Ok(())
}
