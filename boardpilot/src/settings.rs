//! Application settings
//!
//! Theme and language resolve with a fixed precedence: a value stored in
//! the preferences file wins, then a hint from the operating system, then
//! the built-in default (light theme, English).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::localization::Language;

pub const PREFERENCES_FILE: &str = "preferences.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access preferences file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse preferences: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("No configuration directory available on this system")]
    NoConfigDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// What the preferences file holds. Absent fields defer to hints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Preferences reported by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemHints {
    pub theme: Option<Theme>,
    pub language: Option<Language>,
}

impl SystemHints {
    pub fn detect() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `COLORFGBG` for the theme; `LC_ALL`, `LC_MESSAGES`, `LANG` in that
    /// order for the language.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let theme = lookup("COLORFGBG").and_then(|v| theme_from_colorfgbg(&v));
        let language = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| lookup(key))
            .find(|v| !v.trim().is_empty())
            .and_then(|v| Language::from_locale(&v));
        Self { theme, language }
    }
}

/// Terminals export `fg;bg` (sometimes `fg;default;bg`); ANSI background
/// colors 0-6 and 8 are dark.
fn theme_from_colorfgbg(value: &str) -> Option<Theme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(if bg <= 6 || bg == 8 { Theme::Dark } else { Theme::Light })
}

/// Effective settings handed to the controller and front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppSettings {
    pub theme: Theme,
    pub language: Language,
}

impl AppSettings {
    pub fn resolve(stored: &StoredPreferences, hints: &SystemHints) -> Self {
        // an unusable stored code falls through to the system hint
        let stored_language = stored.language.as_deref().and_then(|code| {
            let language = Language::from_code(code);
            if language.is_none() {
                tracing::warn!("Stored language {} not supported, ignoring it", code);
            }
            language
        });

        Self {
            theme: stored.theme.or(hints.theme).unwrap_or_default(),
            language: stored_language.or(hints.language).unwrap_or(Language::DEFAULT),
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn to_stored(&self) -> StoredPreferences {
        StoredPreferences {
            theme: Some(self.theme),
            language: Some(self.language.code().to_string()),
        }
    }
}

/// TOML preferences file on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/boardpilot/preferences.toml`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(dir.join("boardpilot").join(PREFERENCES_FILE))
    }

    pub fn open_default() -> Result<Self, SettingsError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as empty preferences.
    pub fn load(&self) -> Result<StoredPreferences, SettingsError> {
        if !self.path.exists() {
            return Ok(StoredPreferences::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self, prefs: &StoredPreferences) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string(prefs)?)?;
        tracing::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn hints(pairs: &[(&str, &str)]) -> SystemHints {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        SystemHints::from_lookup(|k| map.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_without_anything() {
        let s = AppSettings::resolve(&StoredPreferences::default(), &SystemHints::default());
        assert_eq!(s.theme, Theme::Light);
        assert_eq!(s.language, Language::En);
    }

    #[test]
    fn test_hints_used_when_nothing_stored() {
        let h = hints(&[("COLORFGBG", "15;0"), ("LANG", "de_DE.UTF-8")]);
        let s = AppSettings::resolve(&StoredPreferences::default(), &h);
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(s.language, Language::De);
    }

    #[test]
    fn test_stored_beats_hints() {
        let h = hints(&[("COLORFGBG", "15;0"), ("LANG", "de_DE.UTF-8")]);
        let stored = StoredPreferences {
            theme: Some(Theme::Light),
            language: Some("es".into()),
        };
        let s = AppSettings::resolve(&stored, &h);
        assert_eq!(s.theme, Theme::Light);
        assert_eq!(s.language, Language::Es);
    }

    #[test]
    fn test_locale_variable_order() {
        let h = hints(&[("LC_ALL", ""), ("LC_MESSAGES", "fr_CA.UTF-8"), ("LANG", "de_DE")]);
        assert_eq!(h.language, Some(Language::Fr));
        let h = hints(&[("LANG", "C.UTF-8")]);
        assert_eq!(h.language, None);
    }

    #[test]
    fn test_colorfgbg_parsing() {
        assert_eq!(theme_from_colorfgbg("0;15"), Some(Theme::Light));
        assert_eq!(theme_from_colorfgbg("15;default;8"), Some(Theme::Dark));
        assert_eq!(theme_from_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_unsupported_stored_language_defers_to_hint() {
        let stored = StoredPreferences {
            theme: None,
            language: Some("ja".into()),
        };
        let h = hints(&[("LANG", "fr_FR")]);
        assert_eq!(AppSettings::resolve(&stored, &h).language, Language::Fr);

        let s = AppSettings::resolve(&stored, &SystemHints::default());
        assert_eq!(s.language, Language::En);
    }

    #[test]
    fn test_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join(PREFERENCES_FILE));
        assert_eq!(store.load().unwrap(), StoredPreferences::default());

        let mut settings = AppSettings::default();
        assert_eq!(settings.toggle_theme(), Theme::Dark);
        store.save(&settings.to_stored()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.theme, Some(Theme::Dark));
        assert_eq!(loaded.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        std::fs::write(&path, "theme = [").unwrap();
        assert!(matches!(SettingsStore::new(path).load(), Err(SettingsError::Parse(_))));
    }
}
