//! Patch compiler: merges baseline and toggle identifiers into documents.
//!
//! Identifiers follow a presence rule: an identifier present in the
//! disabled-services document is an override, an absent identifier means
//! "use the device default". Turning a toggle off therefore removes its
//! identifiers; it never writes `false` for them.
use std::collections::BTreeMap;

use crate::document::{CompiledDocument, DocumentValue};
use crate::error::PatchError;
use crate::manifest::LogicalTarget;
use crate::registry::{BaselineSet, BaselineState, ToggleRegistry};

/// Key → value pairs merged verbatim into a document.
pub type FreeFields = BTreeMap<String, DocumentValue>;

/// Preferences key holding the free-text wallet title.
pub const PASSBOOK_TITLE_KEY: &str = "cachedPassbookTitle";

/// Preference booleans written to the preferences document, with defaults.
pub const PREFERENCE_DEFAULTS: &[(&str, bool)] = &[
    ("shouldShowiCloudSpecifiers", false),
    ("showExposureNotificationRow", true),
    ("showPassbookRow", true),
    ("showSOSRow", true),
    ("cachediCloudSubscriber", false),
];

/// How `compile` treats settings keys that name no registered toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTogglePolicy {
    /// Fail with [`PatchError::UnknownToggle`].
    #[default]
    Strict,
    /// Ignore the key.
    Permissive,
}

/// Desired toggle values for one compile request.
///
/// A toggle that is not set is treated as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsState {
    toggles: BTreeMap<String, bool>,
}

impl SettingsState {
    /// Create an empty state (every toggle off).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `name` set to `enabled`.
    #[must_use]
    pub fn with(mut self, name: &str, enabled: bool) -> Self {
        self.set(name, enabled);
        self
    }

    /// Set `name` to `enabled`.
    pub fn set(&mut self, name: &str, enabled: bool) {
        self.toggles.insert(name.to_string(), enabled);
    }

    /// Current value of `name`; unset toggles are `false`.
    #[must_use]
    pub fn get(&self, name: &str) -> bool {
        self.toggles.get(name).copied().unwrap_or(false)
    }

    /// Iterate over explicitly set toggles in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.toggles.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Keys that are not registered in `registry`, in name order.
    #[must_use]
    pub fn unknown_toggles(&self, registry: &ToggleRegistry) -> Vec<&str> {
        self.toggles
            .keys()
            .filter(|name| !registry.contains(name))
            .map(String::as_str)
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for SettingsState {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            toggles: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Compile one document from baseline, toggles, and free fields.
///
/// 1. Baseline: active entries are inserted as `true`, inactive ones removed.
/// 2. Toggles in registry order: on inserts every identifier, off removes
///    every identifier (removing an absent key is a no-op).
/// 3. Free fields are merged last and overwrite earlier values.
///
/// # Errors
///
/// Returns [`PatchError::UnknownToggle`] for the first unknown settings key
/// when `policy` is [`UnknownTogglePolicy::Strict`].
pub fn compile(
    settings: &SettingsState,
    baseline: &BaselineSet,
    registry: &ToggleRegistry,
    free_fields: &FreeFields,
    policy: UnknownTogglePolicy,
) -> Result<CompiledDocument, PatchError> {
    if policy == UnknownTogglePolicy::Strict
        && let Some(name) = settings.unknown_toggles(registry).first()
    {
        return Err(PatchError::UnknownToggle((*name).to_string()));
    }

    let mut doc = CompiledDocument::new();

    for entry in baseline.entries() {
        match entry.state {
            BaselineState::Active => doc.insert(&entry.identifier, DocumentValue::Boolean(true)),
            BaselineState::Inactive => doc.remove(&entry.identifier),
        }
    }

    for name in registry.all_toggle_names() {
        let group = registry.identifiers_for(name)?;
        if settings.get(name) {
            for id in &group.identifiers {
                doc.insert(id, DocumentValue::Boolean(true));
            }
        } else {
            for id in &group.identifiers {
                doc.remove(id);
            }
        }
    }

    for (key, value) in free_fields {
        doc.insert(key, value.clone());
    }

    Ok(doc)
}

/// Build the free fields for the preferences document.
///
/// The title is trimmed and always written, even when empty. Every key in
/// [`PREFERENCE_DEFAULTS`] is written explicitly; `overrides` replace
/// defaults and may add further keys.
#[must_use]
pub fn preference_fields(title: &str, overrides: &FreeFields) -> FreeFields {
    let mut fields: FreeFields = PREFERENCE_DEFAULTS
        .iter()
        .map(|(key, value)| ((*key).to_string(), DocumentValue::Boolean(*value)))
        .collect();
    fields.insert(
        PASSBOOK_TITLE_KEY.to_string(),
        DocumentValue::String(title.trim().to_string()),
    );
    for (key, value) in overrides {
        fields.insert(key.clone(), value.clone());
    }
    fields
}

/// Compile every logical target from the built-in tables.
///
/// The disabled-services document gets the baseline and toggles; the
/// preferences document gets `preferences` only.
///
/// # Errors
///
/// Propagates [`compile`] errors.
pub fn compile_targets(
    settings: &SettingsState,
    preferences: &FreeFields,
    policy: UnknownTogglePolicy,
) -> Result<BTreeMap<LogicalTarget, CompiledDocument>, PatchError> {
    let services = compile(
        settings,
        BaselineSet::builtin(),
        ToggleRegistry::builtin(),
        &FreeFields::new(),
        policy,
    )?;
    let prefs = compile(
        &SettingsState::new(),
        &BaselineSet::default(),
        &ToggleRegistry::default(),
        preferences,
        policy,
    )?;
    Ok(BTreeMap::from([
        (LogicalTarget::DisabledServices, services),
        (LogicalTarget::UserPreferences, prefs),
    ]))
}
