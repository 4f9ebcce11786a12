// Propagation graph output

use super::open_engine;
use encore_engine::EngineConfig;
use encore_ledger::AuditFilter;

/// Print the propagation graph over the whole ledger
pub fn run(config: &EngineConfig) -> anyhow::Result<()> {
    let engine = open_engine(config)?;
    let graph = engine.graph(&AuditFilter::all()).canonical();
    println!("{}", graph.to_json_pretty()?);
    Ok(())
}
