// Command implementations

pub mod graph;
pub mod log;
pub mod resolve;
pub mod validate;

use encore_engine::{ConsentEngine, EngineConfig};

/// Engine for commands that read or append to the configured ledger
pub fn open_engine(config: &EngineConfig) -> anyhow::Result<ConsentEngine> {
    if config.ledger_path.is_none() {
        tracing::warn!("no ledger_path configured; decisions are kept in memory only");
    }
    Ok(ConsentEngine::from_config(config)?)
}
