//! Toggle registry and baseline tables.
//!
//! The registry maps each user-facing toggle to the launchd service
//! identifiers it controls. The baseline lists identifiers whose state is
//! fixed on every compile. Both tables are built once and never mutated.
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::PatchError;

/// Services written to the disabled-services document by the crash-report
/// toggle. Applied as one unit.
const CRASH_REPORT_SERVICES: &[&str] = &[
    "com.apple.ReportCrash",
    "com.apple.ReportCrash.Jetsam",
    "com.apple.ReportMemoryException",
    "com.apple.OTACrashCopier",
    "com.apple.analyticsd",
    "com.apple.aslmanager",
    "com.apple.coresymbolicationd",
    "com.apple.crash_mover",
    "com.apple.crashreportcopymobile",
    "com.apple.DumpBasebandCrash",
    "com.apple.DumpPanic",
    "com.apple.logd",
    "com.apple.logd.admin",
    "com.apple.logd.events",
    "com.apple.logd.watchdog",
    "com.apple.logd_reporter",
    "com.apple.logd_reporter.report_statistics",
    "com.apple.system.logger",
    "com.apple.syslogd",
];

/// One user-facing toggle and the identifiers it controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleGroup {
    /// Toggle name as used in settings files and on the command line.
    pub name: String,
    /// One-line description for listings.
    pub description: String,
    /// Controlled identifiers, in declared order.
    pub identifiers: Vec<String>,
    /// All identifiers are added or removed together.
    pub applies_as_group: bool,
}

impl ToggleGroup {
    /// Build a group from string slices.
    #[must_use]
    pub fn new(
        name: &str,
        description: &str,
        identifiers: &[&str],
        applies_as_group: bool,
    ) -> Self {
        let mut seen = HashSet::new();
        Self {
            name: name.to_string(),
            description: description.to_string(),
            identifiers: identifiers
                .iter()
                .filter(|id| seen.insert(**id))
                .map(|id| (*id).to_string())
                .collect(),
            applies_as_group,
        }
    }
}

/// Read-only table of toggles in declared order.
#[derive(Debug, Clone, Default)]
pub struct ToggleRegistry {
    groups: Vec<ToggleGroup>,
}

impl ToggleRegistry {
    /// Build a registry from groups in the order they should be applied.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first toggle that is declared twice.
    pub fn new(groups: Vec<ToggleGroup>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for group in &groups {
            if !seen.insert(group.name.as_str()) {
                anyhow::bail!("duplicate toggle '{}'", group.name);
            }
        }
        Ok(Self { groups })
    }

    /// The built-in service toggles.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN_REGISTRY
    }

    /// Look up a toggle by name.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::UnknownToggle`] if `name` is not registered.
    pub fn identifiers_for(&self, name: &str) -> Result<&ToggleGroup, PatchError> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| PatchError::UnknownToggle(name.to_string()))
    }

    /// Toggle names in declared order.
    #[must_use]
    pub fn all_toggle_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name)
    }

    /// All groups in declared order.
    #[must_use]
    pub fn groups(&self) -> &[ToggleGroup] {
        &self.groups
    }

    /// Groups whose identifiers must be applied atomically.
    pub fn atomic_groups(&self) -> impl Iterator<Item = &ToggleGroup> {
        self.groups.iter().filter(|g| g.applies_as_group)
    }
}

static BUILTIN_REGISTRY: LazyLock<ToggleRegistry> = LazyLock::new(|| ToggleRegistry {
    groups: vec![
        ToggleGroup::new(
            "disable_thermalmonitord",
            "Disables temperature monitoring daemon",
            &["com.apple.thermalmonitord"],
            false,
        ),
        ToggleGroup::new(
            "disable_ota",
            "Stops OTA updates",
            &[
                "com.apple.mobile.softwareupdated",
                "com.apple.OTATaskingAgent",
                "com.apple.softwareupdateservicesd",
            ],
            false,
        ),
        ToggleGroup::new(
            "disable_usage_tracking",
            "Disables usage tracking",
            &["com.apple.UsageTrackingAgent"],
            false,
        ),
        ToggleGroup::new(
            "disable_game_center",
            "Disables Game Center",
            &["com.apple.gamed"],
            false,
        ),
        ToggleGroup::new(
            "disable_screen_time",
            "Disables Screen Time agent",
            &["com.apple.ScreenTimeAgent"],
            false,
        ),
        ToggleGroup::new(
            "disable_crash_reports",
            "Disables logs, dumps, and crash reports",
            CRASH_REPORT_SERVICES,
            true,
        ),
        ToggleGroup::new(
            "disable_tips",
            "Disables tips service",
            &["com.apple.tipsd"],
            false,
        ),
    ],
});

/// Fixed state for a baseline identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineState {
    /// Always present as `true`.
    Active,
    /// Always absent.
    Inactive,
}

/// One identifier with a forced state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineEntry {
    /// Service identifier.
    pub identifier: String,
    /// State applied on every compile.
    pub state: BaselineState,
}

/// Identifiers forced to a fixed state regardless of toggles.
#[derive(Debug, Clone, Default)]
pub struct BaselineSet {
    entries: Vec<BaselineEntry>,
}

impl BaselineSet {
    /// Build a baseline from `(identifier, state)` pairs.
    #[must_use]
    pub fn new(entries: &[(&str, BaselineState)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(id, state)| BaselineEntry {
                    identifier: (*id).to_string(),
                    state: *state,
                })
                .collect(),
        }
    }

    /// The built-in baseline for the disabled-services document.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN_BASELINE
    }

    /// Entries in declared order.
    #[must_use]
    pub fn entries(&self) -> &[BaselineEntry] {
        &self.entries
    }

    /// Returns `true` if `identifier` has a fixed state.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|e| e.identifier == identifier)
    }

    /// Identifiers claimed by both the baseline and a toggle in `registry`.
    ///
    /// Must be empty for baseline state to be unaffected by toggles.
    #[must_use]
    pub fn overlap<'a>(&self, registry: &'a ToggleRegistry) -> Vec<&'a str> {
        registry
            .groups()
            .iter()
            .flat_map(|g| g.identifiers.iter())
            .filter(|id| self.contains(id))
            .map(String::as_str)
            .collect()
    }
}

static BUILTIN_BASELINE: LazyLock<BaselineSet> = LazyLock::new(|| {
    use BaselineState::{Active, Inactive};
    BaselineSet::new(&[
        ("com.apple.magicswitchd.companion", Active),
        ("com.apple.security.otpaird", Active),
        ("com.apple.dhcp6d", Active),
        ("com.apple.bootpd", Active),
        ("com.apple.ftp-proxy-embedded", Inactive),
        ("com.apple.relevanced", Active),
    ])
});
