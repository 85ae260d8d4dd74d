//! Settings file loading and resolution.
//!
//! The settings file is TOML:
//!
//! ```toml
//! [toggles]
//! disable_ota = true
//! disable_crash_reports = false
//!
//! [preferences]
//! cachedPassbookTitle = "Hitori"
//! showSOSRow = false
//!
//! [options]
//! skip_setup = true
//! strict = true
//! format = "xml"
//! ```
//!
//! Command-line [`Overrides`] are applied on top of the file.
pub mod toml_loader;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::compiler::{self, FreeFields, PASSBOOK_TITLE_KEY, SettingsState, UnknownTogglePolicy};
use crate::document::{DocumentFormat, DocumentValue};
use crate::error::{ConfigError, QuietdError};
use crate::manifest::AssembleOptions;

/// Default settings file name looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "quietd.toml";

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "QUIETD_SETTINGS";

/// Raw contents of the settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    /// Toggle name → enabled.
    pub toggles: BTreeMap<String, bool>,
    /// Preferences document keys.
    pub preferences: toml::Table,
    /// Compile and assembly options.
    pub options: OptionsSection,
}

/// The `[options]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsSection {
    /// Append the setup-skip overlay.
    pub skip_setup: bool,
    /// Reject unknown toggle names.
    pub strict: bool,
    /// Document encoding.
    pub format: DocumentFormat,
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self {
            skip_setup: true,
            strict: true,
            format: DocumentFormat::Xml,
        }
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Toggles forced on.
    pub enable: Vec<String>,
    /// Toggles forced off; applied after `enable`.
    pub disable: Vec<String>,
    /// Replacement wallet title.
    pub title: Option<String>,
    /// Replacement unknown-toggle policy.
    pub strict: Option<bool>,
    /// Replacement encoding.
    pub format: Option<DocumentFormat>,
    /// Replacement setup-skip flag.
    pub skip_setup: Option<bool>,
}

/// Fully resolved inputs for one compile request.
#[derive(Debug, Clone)]
pub struct Config {
    /// File the settings were read from, if any.
    pub source: Option<PathBuf>,
    /// Toggle values.
    pub settings: SettingsState,
    /// Free fields of the preferences document, defaults included.
    pub preferences: FreeFields,
    /// Unknown-toggle policy.
    pub policy: UnknownTogglePolicy,
    /// Assembly options.
    pub assemble: AssembleOptions,
}

impl Config {
    /// Load the settings file at `path` (if any) and apply `overrides`.
    ///
    /// # Errors
    ///
    /// Returns [`QuietdError::Config`] if the file cannot be read or parsed,
    /// and the errors of [`Config::resolve`].
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, QuietdError> {
        let file: SettingsFile = match path {
            Some(p) => toml_loader::load_config(p)?,
            None => SettingsFile::default(),
        };
        let mut config = Self::resolve(file, overrides)?;
        config.source = path.map(Path::to_path_buf);
        Ok(config)
    }

    /// Combine a parsed settings file with command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns [`QuietdError::Config`] if `cachedPassbookTitle` is not a
    /// string, and [`QuietdError::Patch`] if another preference value has an
    /// unsupported type.
    pub fn resolve(file: SettingsFile, overrides: &Overrides) -> Result<Self, QuietdError> {
        let mut settings: SettingsState = file.toggles.into_iter().collect();
        for name in &overrides.enable {
            settings.set(name, true);
        }
        for name in &overrides.disable {
            settings.set(name, false);
        }

        let mut title = String::new();
        let mut pref_overrides = FreeFields::new();
        for (key, value) in &file.preferences {
            if key == PASSBOOK_TITLE_KEY {
                title = value
                    .as_str()
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: format!("preferences.{key}"),
                        message: format!("expected a string, found {}", value.type_str()),
                    })?
                    .to_string();
            } else {
                pref_overrides.insert(key.clone(), DocumentValue::from_toml(key, value)?);
            }
        }
        if let Some(t) = &overrides.title {
            title.clone_from(t);
        }

        let strict = overrides.strict.unwrap_or(file.options.strict);
        Ok(Self {
            source: None,
            settings,
            preferences: compiler::preference_fields(&title, &pref_overrides),
            policy: if strict {
                UnknownTogglePolicy::Strict
            } else {
                UnknownTogglePolicy::Permissive
            },
            assemble: AssembleOptions {
                include_setup_skip: overrides.skip_setup.unwrap_or(file.options.skip_setup),
                format: overrides.format.unwrap_or(file.options.format),
            },
        })
    }
}

/// Resolve which settings file to read from the process environment.
///
/// Order: explicit path, then `$QUIETD_SETTINGS`, then `./quietd.toml` if it
/// exists. `None` means "use defaults".
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if an explicitly named file, or the file
/// named by `$QUIETD_SETTINGS`, does not exist.
pub fn resolve_settings_path(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    locate_settings(
        explicit,
        std::env::var_os(SETTINGS_ENV).map(PathBuf::from),
        Path::new("."),
    )
}

/// [`resolve_settings_path`] with the environment value and working
/// directory passed in.
fn locate_settings(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    cwd: &Path,
) -> Result<Option<PathBuf>, ConfigError> {
    let named = explicit
        .map(|p| (p.to_path_buf(), "--settings"))
        .or_else(|| from_env.map(|p| (p, SETTINGS_ENV)));
    if let Some((path, origin)) = named {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
                origin,
            });
        }
        return Ok(Some(path));
    }

    let local = cwd.join(DEFAULT_SETTINGS_FILE);
    Ok(local.exists().then_some(local))
}
