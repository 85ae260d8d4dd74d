#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Manifest addressing and the end-to-end compile scenarios.

mod common;

use std::collections::BTreeMap;

use quietd_cli::compiler::{self, FreeFields, SettingsState, UnknownTogglePolicy};
use quietd_cli::document::{DocumentFormat, DocumentValue, decode};
use quietd_cli::manifest::{self, AssembleOptions, LogicalTarget};
use quietd_cli::registry::ToggleRegistry;

fn default_targets() -> BTreeMap<LogicalTarget, quietd_cli::document::CompiledDocument> {
    compiler::compile_targets(
        &SettingsState::new(),
        &compiler::preference_fields("", &FreeFields::new()),
        UnknownTogglePolicy::Strict,
    )
    .unwrap()
}

#[test]
fn default_manifest_layout() {
    let manifest = manifest::assemble(&default_targets(), AssembleOptions::default()).unwrap();
    insta::assert_snapshot!("manifest_layout", common::layout(&manifest));
}

#[test]
fn layout_is_independent_of_format() {
    let xml = manifest::assemble(&default_targets(), AssembleOptions::default()).unwrap();
    let binary = manifest::assemble(
        &default_targets(),
        AssembleOptions {
            format: DocumentFormat::Binary,
            ..AssembleOptions::default()
        },
    )
    .unwrap();
    assert_eq!(common::layout(&xml), common::layout(&binary));
    for (a, b) in xml.descriptors.iter().zip(&binary.descriptors) {
        assert_ne!(a.content, b.content);
        assert_eq!(decode(&a.content).unwrap(), decode(&b.content).unwrap());
    }
}

#[test]
fn preferences_are_written_to_both_domains() {
    let manifest = manifest::assemble(
        &default_targets(),
        AssembleOptions {
            include_setup_skip: false,
            ..AssembleOptions::default()
        },
    )
    .unwrap();
    assert_eq!(manifest.descriptors.len(), 3);
    assert_eq!(manifest.descriptors[1].content, manifest.descriptors[2].content);
    assert_ne!(manifest.descriptors[1].domain, manifest.descriptors[2].domain);
}

#[test]
fn ota_on_crash_reports_off() {
    let settings = SettingsState::new()
        .with("disable_ota", true)
        .with("disable_crash_reports", false);
    let doc = common::compile_services(&settings);
    let keys: Vec<&str> = doc.keys().collect();
    assert_eq!(
        keys,
        vec![
            "com.apple.OTATaskingAgent",
            "com.apple.bootpd",
            "com.apple.dhcp6d",
            "com.apple.magicswitchd.companion",
            "com.apple.mobile.softwareupdated",
            "com.apple.relevanced",
            "com.apple.security.otpaird",
            "com.apple.softwareupdateservicesd",
        ]
    );
}

#[test]
fn crash_reports_on_writes_every_identifier() {
    let doc = common::compile_services(&SettingsState::new().with("disable_crash_reports", true));
    let group = ToggleRegistry::builtin()
        .identifiers_for("disable_crash_reports")
        .unwrap();
    assert_eq!(group.identifiers.len(), 19);
    for id in &group.identifiers {
        assert_eq!(doc.get(id), Some(&DocumentValue::Boolean(true)), "{id}");
    }
}

#[test]
fn free_text_title_lands_in_preferences_only() {
    let prefs = compiler::preference_fields("  Wallet  ", &FreeFields::new());
    let targets = compiler::compile_targets(
        &SettingsState::new().with("disable_tips", true),
        &prefs,
        UnknownTogglePolicy::Strict,
    )
    .unwrap();

    let services = &targets[&LogicalTarget::DisabledServices];
    let preferences = &targets[&LogicalTarget::UserPreferences];
    assert!(!services.contains_key(compiler::PASSBOOK_TITLE_KEY));
    assert!(!preferences.contains_key("com.apple.tipsd"));
    assert_eq!(
        preferences.get(compiler::PASSBOOK_TITLE_KEY),
        Some(&DocumentValue::from("Wallet"))
    );
    for (key, value) in compiler::PREFERENCE_DEFAULTS {
        assert_eq!(preferences.get(key), Some(&DocumentValue::Boolean(*value)), "{key}");
    }
}

#[test]
fn free_fields_overwrite_toggle_output() {
    let fields = FreeFields::from([("com.apple.gamed".to_string(), DocumentValue::from("kept"))]);
    let doc = common::compile_with_fields(
        &SettingsState::new().with("disable_game_center", true),
        &fields,
    );
    assert_eq!(doc.get("com.apple.gamed"), Some(&DocumentValue::from("kept")));
}

#[test]
fn differing_title_changes_only_that_key() {
    let compile = |title: &str| {
        compiler::compile_targets(
            &SettingsState::new().with("disable_ota", true),
            &compiler::preference_fields(title, &FreeFields::new()),
            UnknownTogglePolicy::Strict,
        )
        .unwrap()
    };
    let (a, b) = (compile("Wallet"), compile("Cards"));
    assert_eq!(
        a[&LogicalTarget::DisabledServices],
        b[&LogicalTarget::DisabledServices]
    );

    let (pa, pb) = (&a[&LogicalTarget::UserPreferences], &b[&LogicalTarget::UserPreferences]);
    let changed: Vec<&str> = pa
        .iter()
        .filter(|(key, value)| pb.get(key) != Some(*value))
        .map(|(key, _)| key)
        .collect();
    assert_eq!(changed, vec![compiler::PASSBOOK_TITLE_KEY]);
    assert_eq!(pa.len(), pb.len());
}
