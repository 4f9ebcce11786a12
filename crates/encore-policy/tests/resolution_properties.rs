//! Property tests for bundle resolution

use chrono::{TimeZone, Utc};
use encore_policy::model::{BundleDraft, Condition, PermissionEntry, PermissionType, PermissionValue};
use encore_policy::{DecisionBasis, OverrideResolver, PermissionBundle, UniformOverride};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn arb_permission_type() -> impl Strategy<Value = PermissionType> {
    prop::sample::select(PermissionType::ALL.to_vec())
}

fn arb_value() -> impl Strategy<Value = PermissionValue> {
    prop_oneof![
        Just(PermissionValue::Allow),
        Just(PermissionValue::Deny),
        Just(PermissionValue::Ask),
        (0.0f64..=1.0).prop_map(|rate| PermissionValue::AllowWithRoyalty {
            rate: encore_policy::RoyaltyRate::new(rate).unwrap()
        }),
        "[A-Za-z ]{1,24}".prop_filter_map("blank attribution", |text| {
            PermissionValue::with_attribution(text).ok()
        }),
    ]
}

fn arb_platform() -> impl Strategy<Value = String> {
    "platform-[a-e]"
}

fn arb_entry() -> impl Strategy<Value = PermissionEntry> {
    (
        arb_permission_type(),
        arb_value(),
        prop::collection::vec(arb_platform(), 0..3),
    )
        .prop_map(|(permission_type, value, platforms)| {
            platforms.into_iter().fold(
                PermissionEntry::new(permission_type, value),
                |entry, platform| entry.with_condition(Condition::authorized_platform(platform)),
            )
        })
}

/// Bundles with at most one entry per permission type
fn arb_bundle() -> impl Strategy<Value = PermissionBundle> {
    (prop::collection::vec(arb_entry(), 0..10), arb_value()).prop_map(|(entries, default)| {
        let unique: BTreeMap<PermissionType, PermissionEntry> = entries
            .into_iter()
            .map(|entry| (entry.permission_type, entry))
            .collect();
        unique
            .into_values()
            .fold(
                BundleDraft::new(
                    "artist-1",
                    default,
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                ),
                BundleDraft::with_entry,
            )
            .build()
            .unwrap()
    })
}

proptest! {
    #[test]
    fn prop_absent_types_resolve_to_default(
        bundle in arb_bundle(),
        requester in arb_platform(),
    ) {
        let resolver = OverrideResolver::default();
        for permission_type in PermissionType::ALL {
            if bundle.entry(permission_type).is_none() {
                let decision = bundle.resolve(permission_type, &requester, &resolver);
                prop_assert_eq!(&decision.value, bundle.default_permission());
                prop_assert_eq!(decision.basis, DecisionBasis::BundleDefault);
            }
        }
    }

    #[test]
    fn prop_authorized_platform_always_overridden(
        bundle in arb_bundle(),
        requester in arb_platform(),
    ) {
        let resolver = OverrideResolver::default();
        for entry in bundle.permissions() {
            let decision = bundle.resolve(entry.permission_type, &requester, &resolver);
            let authorized = entry.authorized_platforms().any(|p| p == requester);
            if authorized {
                prop_assert!(decision.is_override());
                prop_assert!(decision.reason.contains(requester.as_str()));
            } else {
                prop_assert_eq!(&decision.value, &entry.value);
                prop_assert_eq!(decision.basis, DecisionBasis::BasePolicy);
            }
        }
    }

    #[test]
    fn prop_override_grants_configured_terms(
        bundle in arb_bundle(),
        requester in arb_platform(),
        terms in arb_value(),
    ) {
        let resolver = OverrideResolver::with_terms(Arc::new(UniformOverride(terms.clone())));
        for entry in bundle.permissions() {
            if !entry.authorized_platforms().any(|p| p == requester) {
                continue;
            }
            let decision = bundle.resolve(entry.permission_type, &requester, &resolver);
            prop_assert!(decision.is_override());
            prop_assert_eq!(&decision.value, &terms);
            if terms != entry.value {
                prop_assert_ne!(&decision.value, &entry.value);
            }
        }
    }

    #[test]
    fn prop_resolution_is_deterministic(
        bundle in arb_bundle(),
        permission_type in arb_permission_type(),
        requester in arb_platform(),
    ) {
        let resolver = OverrideResolver::default();
        let first = bundle.resolve(permission_type, &requester, &resolver);
        let second = bundle.resolve(permission_type, &requester, &resolver);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_bundle_json_reparses(bundle in arb_bundle()) {
        let json = serde_json::to_string(&bundle).unwrap();
        let parsed = PermissionBundle::from_json_str(&json).unwrap();
        prop_assert_eq!(parsed.permissions().len(), bundle.permissions().len());
        prop_assert_eq!(parsed.default_permission().kind(), bundle.default_permission().kind());
        for (a, b) in parsed.permissions().iter().zip(bundle.permissions()) {
            prop_assert_eq!(a.permission_type, b.permission_type);
            prop_assert_eq!(&a.conditions, &b.conditions);
        }
    }
}

#[test]
fn voice_cloning_override_example() {
    let bundle = BundleDraft::new(
        "artist-1",
        PermissionValue::Ask,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
    .with_entry(
        PermissionEntry::new(PermissionType::VoiceCloning, PermissionValue::Deny)
            .with_condition(Condition::authorized_platform("platform-X")),
    )
    .build()
    .unwrap();
    let resolver = OverrideResolver::default();

    let x = bundle.resolve(PermissionType::VoiceCloning, "platform-X", &resolver);
    assert!(x.is_override());
    assert_ne!(x.value, PermissionValue::Deny);

    let y = bundle.resolve(PermissionType::VoiceCloning, "platform-Y", &resolver);
    assert_eq!(y.value, PermissionValue::Deny);
}
