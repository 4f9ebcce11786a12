// Request resolution

use super::open_engine;
use encore_engine::{load_bundle, EngineConfig, ResolutionRequest};
use encore_ledger::RequesterType;
use std::path::PathBuf;

/// Arguments of `encore resolve`
pub struct ResolveArgs {
    pub bundle: PathBuf,
    pub requester_id: String,
    pub requester_name: String,
    pub requester_type: RequesterType,
    pub permission: String,
    pub work_title: Option<String>,
}

/// Resolve one request, record it, and print the decision
pub fn run(config: &EngineConfig, args: ResolveArgs) -> anyhow::Result<()> {
    let mut request = ResolutionRequest::parse(
        args.requester_id,
        args.requester_name,
        args.requester_type,
        &args.permission,
    )?;
    request.work_title = args.work_title;

    let bundle = load_bundle(&args.bundle)?;
    let engine = open_engine(config)?;
    let decision = engine.decide_with(&bundle, &request)?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
