//! Restore manifest assembly.
//!
//! Every compiled document is encoded and wrapped into one
//! [`RestoreDescriptor`] per storage binding of its logical target. The
//! setup-skip overlay adds two fixed documents that do not depend on settings.
use std::collections::BTreeMap;
use std::fmt;

use crate::document::{CompiledDocument, DocumentFormat, DocumentValue, encode};
use crate::error::PatchError;

/// First-run setup panes marked as skipped by the overlay.
pub const SKIPPED_SETUP_PANES: &[&str] = &[
    "WiFi",
    "Location",
    "Restore",
    "SIMSetup",
    "Android",
    "AppleID",
    "IntendedUser",
    "TOS",
    "Siri",
    "ScreenTime",
    "Diagnostics",
    "SoftwareUpdate",
    "Passcode",
    "Biometric",
    "Payment",
    "Zoom",
    "DisplayTone",
    "MessagingActivationUsingPhoneNumber",
    "HomeButtonSensitivity",
    "CloudStorage",
    "ScreenSaver",
    "TapToSetup",
    "Keyboard",
    "PreferredLanguage",
    "SpokenLanguage",
    "WatchMigration",
    "OnBoarding",
    "TVProviderSignIn",
    "TVHomeScreenSync",
    "Privacy",
    "TVRoom",
    "iMessageAndFaceTime",
    "AppStore",
    "Safety",
    "Multitasking",
    "ActionButton",
    "TermsOfAddress",
    "AccessibilityAppearance",
    "Welcome",
    "Appearance",
    "RestoreCompleted",
    "UpdateCompleted",
];

/// A document produced by the compiler, identified by what it configures.
///
/// Variant order is the descriptor order in an assembled manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum LogicalTarget {
    /// launchd disabled-services overrides.
    DisabledServices,
    /// Settings app preferences.
    #[value(name = "preferences")]
    UserPreferences,
}

impl LogicalTarget {
    /// Storage locations this target is written to.
    #[must_use]
    pub const fn bindings(self) -> &'static [Binding] {
        match self {
            Self::DisabledServices => DISABLED_SERVICES_BINDINGS,
            Self::UserPreferences => USER_PREFERENCES_BINDINGS,
        }
    }

    /// Stable name used in logs and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DisabledServices => "disabled-services",
            Self::UserPreferences => "preferences",
        }
    }
}

impl fmt::Display for LogicalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where on the device a document lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Protected storage domain.
    pub domain: &'static str,
    /// Path relative to the domain root.
    pub relative_path: &'static str,
    /// Owner uid; `None` leaves the default.
    pub owner: Option<u32>,
    /// Group gid; `None` leaves the default.
    pub group: Option<u32>,
}

impl Binding {
    fn descriptor(&self, content: Vec<u8>) -> RestoreDescriptor {
        RestoreDescriptor {
            content,
            domain: self.domain.to_string(),
            relative_path: self.relative_path.to_string(),
            owner: self.owner,
            group: self.group,
        }
    }
}

const DISABLED_SERVICES_BINDINGS: &[Binding] = &[Binding {
    domain: "DatabaseDomain",
    relative_path: "com.apple.xpc.launchd/disabled.plist",
    owner: Some(0),
    group: Some(0),
}];

// The same bytes must be visible from both domains.
const USER_PREFERENCES_BINDINGS: &[Binding] = &[
    Binding {
        domain: "HomeDomain",
        relative_path: "Library/Preferences/com.apple.Preferences.plist",
        owner: Some(0),
        group: Some(0),
    },
    Binding {
        domain: "ManagedPreferencesDomain",
        relative_path: "mobile/com.apple.Preferences.plist",
        owner: Some(0),
        group: Some(0),
    },
];

const CLOUD_CONFIGURATION_BINDING: Binding = Binding {
    domain: "SysSharedContainerDomain-.",
    relative_path: "systemgroup.com.apple.configurationprofiles/Library/ConfigurationProfiles/CloudConfigurationDetails.plist",
    owner: None,
    group: None,
};

const PURPLEBUDDY_BINDING: Binding = Binding {
    domain: "ManagedPreferencesDomain",
    relative_path: "mobile/com.apple.purplebuddy.plist",
    owner: None,
    group: None,
};

/// One file write addressed to a storage domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreDescriptor {
    /// Encoded file content.
    pub content: Vec<u8>,
    /// Protected storage domain.
    pub domain: String,
    /// Path relative to the domain root.
    pub relative_path: String,
    /// Owner uid, if set.
    pub owner: Option<u32>,
    /// Group gid, if set.
    pub group: Option<u32>,
}

/// Ordered descriptors plus the reboot flag handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Descriptors in write order.
    pub descriptors: Vec<RestoreDescriptor>,
    /// Restart the device after writing.
    pub reboot: bool,
}

/// Options for [`assemble`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Append the two setup-skip overlay documents.
    pub include_setup_skip: bool,
    /// Encoding for every document.
    pub format: DocumentFormat,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            include_setup_skip: true,
            format: DocumentFormat::Xml,
        }
    }
}

/// Fixed document marking cloud configuration as applied and every setup
/// pane as skipped.
#[must_use]
pub fn cloud_configuration_document() -> CompiledDocument {
    [
        (
            "SkipSetup",
            DocumentValue::List(SKIPPED_SETUP_PANES.iter().map(|s| (*s).to_string()).collect()),
        ),
        ("AllowPairing", DocumentValue::Boolean(true)),
        ("ConfigurationWasApplied", DocumentValue::Boolean(true)),
        ("CloudConfigurationUIComplete", DocumentValue::Boolean(true)),
        ("ConfigurationSource", DocumentValue::Integer(0)),
        ("PostSetupProfileWasInstalled", DocumentValue::Boolean(true)),
        ("IsSupervised", DocumentValue::Boolean(false)),
    ]
    .into_iter()
    .collect()
}

/// Fixed document marking first-run setup as finished.
#[must_use]
pub fn setup_done_document() -> CompiledDocument {
    [
        ("SetupDone", DocumentValue::Boolean(true)),
        ("SetupFinishedAllSteps", DocumentValue::Boolean(true)),
        ("UserChoseLanguage", DocumentValue::Boolean(true)),
    ]
    .into_iter()
    .collect()
}

/// Assemble a manifest from compiled documents.
///
/// Descriptors follow [`LogicalTarget`] order, one per binding, followed by
/// the overlay when requested. `reboot` is always set.
///
/// # Errors
///
/// Returns [`PatchError::EncodingFailure`] if a document cannot be encoded.
pub fn assemble(
    compiled: &BTreeMap<LogicalTarget, CompiledDocument>,
    options: AssembleOptions,
) -> Result<Manifest, PatchError> {
    let mut descriptors = Vec::new();

    for (target, document) in compiled {
        let content = encode(document, options.format)?;
        descriptors.extend(
            target
                .bindings()
                .iter()
                .map(|binding| binding.descriptor(content.clone())),
        );
    }

    if options.include_setup_skip {
        descriptors.push(
            CLOUD_CONFIGURATION_BINDING
                .descriptor(encode(&cloud_configuration_document(), options.format)?),
        );
        descriptors
            .push(PURPLEBUDDY_BINDING.descriptor(encode(&setup_done_document(), options.format)?));
    }

    Ok(Manifest {
        descriptors,
        reboot: true,
    })
}
