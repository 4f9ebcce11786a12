//! End-to-end flows through the consent engine

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use encore_core::{EncoreConfig, EncoreError, PlatformInfo};
use encore_engine::{ConsentEngine, EngineConfig, ResolutionRequest};
use encore_graph::NodeKind;
use encore_ledger::{AuditFilter, AuditLedger, RequesterType};
use encore_policy::{
    BundleDraft, BundleKey, Condition, DelegationChain, DelegationEntry, DelegationRole,
    PermissionEntry, PermissionType, PermissionValue,
};
use std::sync::Arc;
use std::thread;

fn catalog() -> BundleDraft {
    let chain = DelegationChain::from(vec![
        DelegationEntry::owner("artist-1", "Nova"),
        DelegationEntry::delegate("mgr-1", "Northside Mgmt", DelegationRole::Manager, true, false),
    ]);
    BundleDraft::new(
        "artist-1",
        PermissionValue::Ask,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
    .with_delegation_chain(chain)
    .with_entry(
        PermissionEntry::new(PermissionType::VoiceCloning, PermissionValue::Deny)
            .with_condition(Condition::authorized_platform("platform-x")),
    )
    .with_entry(PermissionEntry::new(
        PermissionType::Stream,
        PermissionValue::with_royalty(0.12).unwrap(),
    ))
}

fn request(id: &str, name: &str, permission_type: PermissionType) -> ResolutionRequest {
    ResolutionRequest::new(id, name, RequesterType::AiCompany, permission_type)
}

#[test]
fn decisions_follow_published_versions() {
    let engine = ConsentEngine::in_memory();
    let v1 = engine.store().create(catalog()).unwrap();
    let key = v1.key();

    let before = engine
        .decide(&key, &request("platform-y", "Platform Y", PermissionType::Remix))
        .unwrap();
    assert_eq!(before.decision.value, PermissionValue::Ask);

    let mut edit = v1.to_draft();
    edit.upsert_entry(PermissionEntry::new(PermissionType::Remix, PermissionValue::Deny));
    engine.store().publish("mgr-1", edit).unwrap();

    let after = engine
        .decide(&key, &request("platform-y", "Platform Y", PermissionType::Remix))
        .unwrap();
    assert_eq!(after.decision.value, PermissionValue::Deny);
    assert_eq!(after.bundle_version, 2);

    // Earlier entries keep what was decided at the time
    let log = engine.audit_log(&AuditFilter::all().permission_type(PermissionType::Remix));
    let results: Vec<_> = log.iter().map(|e| e.result.clone()).collect();
    assert_eq!(results, [PermissionValue::Ask, PermissionValue::Deny]);
}

#[test]
fn override_reason_uses_configured_registry() {
    let config = EngineConfig {
        platforms: vec![PlatformInfo::new("platform-x", "Xylo AI").with_certified(true)],
        default_override: PermissionValue::with_attribution("Voice model by Nova").unwrap(),
        ..EngineConfig::default()
    };
    config.validate().unwrap();
    let engine = ConsentEngine::from_config(&config).unwrap();
    let bundle = engine.store().create(catalog()).unwrap();

    let decision = engine
        .decide(
            &bundle.key(),
            &request("platform-x", "Xylo AI", PermissionType::VoiceCloning),
        )
        .unwrap();
    assert!(decision.decision.is_override());
    assert_eq!(
        decision.decision.reason,
        "authorized platform override for Xylo AI (platform-x)"
    );
    assert_eq!(
        decision.entry.result.attribution_requirement(),
        Some("Voice model by Nova")
    );
}

#[test]
fn unknown_permission_type_leaves_ledger_untouched() {
    let engine = ConsentEngine::in_memory();
    engine.store().create(catalog()).unwrap();

    let parsed = ResolutionRequest::parse(
        "platform-y",
        "Platform Y",
        RequesterType::AiCompany,
        "MIND_READING",
    );
    assert_matches!(parsed, Err(EncoreError::UnknownPermissionType { .. }));
    assert!(engine.ledger().is_empty());
}

#[test]
fn graph_reflects_recorded_decisions() {
    let engine = ConsentEngine::in_memory();
    let key = engine.store().create(catalog()).unwrap().key();

    for name in ["Spotify", "spotify", "SPOTIFY!"] {
        let req = ResolutionRequest::new(
            "spotify",
            name,
            RequesterType::StreamingPlatform,
            PermissionType::Stream,
        );
        engine.decide(&key, &req).unwrap();
    }
    engine
        .decide(
            &key,
            &request("laion", "LAION", PermissionType::DatasetInclusion),
        )
        .unwrap();

    let graph = engine.graph(&AuditFilter::all());
    assert_eq!(graph.nodes_of_kind(NodeKind::Platform).count(), 1);
    assert_eq!(
        graph
            .links_between("platform:spotify", "distribution_licensing")
            .count(),
        3
    );
    assert_eq!(engine.latest_results().len(), 1);

    let ai_only = engine.graph(&AuditFilter::all().requester_type(RequesterType::AiCompany));
    assert_eq!(ai_only.nodes.len(), 4);
    assert_eq!(ai_only.links.len(), 3);
}

#[test]
fn concurrent_decisions_are_all_recorded() {
    let engine = Arc::new(ConsentEngine::in_memory());
    let key = engine.store().create(catalog()).unwrap().key();

    let handles: Vec<_> = (0..6)
        .map(|t| {
            let engine = engine.clone();
            let key: BundleKey = key.clone();
            thread::spawn(move || {
                for n in 0..25 {
                    let pt = PermissionType::ALL[(t + n) % PermissionType::ALL.len()];
                    engine
                        .decide(&key, &request(&format!("p{t}"), &format!("P{t}"), pt))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.ledger().len(), 150);
    assert_eq!(engine.ledger().head(), 150);
}

#[test]
fn persistent_ledger_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        ledger_path: Some(dir.path().join("ledger.jsonl")),
        sync_writes: true,
        ..EngineConfig::default()
    };

    {
        let engine = ConsentEngine::from_config(&config).unwrap();
        let key = engine.store().create(catalog()).unwrap().key();
        engine
            .decide(&key, &request("platform-x", "Xylo", PermissionType::VoiceCloning))
            .unwrap();
    }

    let engine = ConsentEngine::from_config(&config).unwrap();
    let log = engine.audit_log(&AuditFilter::all());
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].requester_id.as_deref(), Some("platform-x"));
    assert_eq!(log[0].result, PermissionValue::Allow);
}
