//! Localization
//!
//! Flat string tables keyed by language, loaded once, with a lookup that
//! never fails: active language, then the default language, then the
//! caller's fallback, then the key itself.
//!
//! Tables ship embedded in the binary. A directory of `<code>.json` files
//! can replace them; a missing or malformed file degrades to an empty table
//! for that language.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const EMBEDDED_EN: &str = include_str!("../locales/en.json");
const EMBEDDED_FR: &str = include_str!("../locales/fr.json");
const EMBEDDED_DE: &str = include_str!("../locales/de.json");
const EMBEDDED_ES: &str = include_str!("../locales/es.json");

/// Flat key -> string table for one language.
pub type Translations = HashMap<String, String>;

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    De,
    Es,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Fr, Language::De, Language::Es];

    pub const DEFAULT: Language = Language::En;

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Es => "es",
        }
    }

    /// English name, used in the system instruction sent to the model.
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "French",
            Language::De => "German",
            Language::Es => "Spanish",
        }
    }

    /// Endonym used when no translation for `language.<code>` exists.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "Français",
            Language::De => "Deutsch",
            Language::Es => "Español",
        }
    }

    /// BCP 47 tag handed to speech facilities.
    pub fn speech_tag(&self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Fr => "fr-FR",
            Language::De => "de-DE",
            Language::Es => "es-ES",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_lowercase();
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Parse a code, coercing anything unsupported to the default language.
    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            tracing::warn!(
                "Language {} not supported, defaulting to {}",
                code,
                Self::DEFAULT.code()
            );
            Self::DEFAULT
        })
    }

    /// Extract the language from a POSIX or browser locale such as
    /// `fr_FR.UTF-8` or `de-AT`.
    pub fn from_locale(locale: &str) -> Option<Self> {
        let primary = locale
            .split(['_', '-', '.', '@'])
            .next()
            .unwrap_or_default();
        Self::from_code(primary)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Process-wide string lookup for the active language.
#[derive(Debug, Clone)]
pub struct Localizer {
    language: Language,
    tables: HashMap<Language, Translations>,
}

impl Localizer {
    /// Localizer with no strings at all; every lookup yields its fallback
    /// or the key.
    pub fn empty() -> Self {
        Self::with_tables(HashMap::new())
    }

    pub fn with_tables(tables: HashMap<Language, Translations>) -> Self {
        Self {
            language: Language::DEFAULT,
            tables,
        }
    }

    /// Tables compiled into the binary.
    pub fn embedded() -> Self {
        let sources = [
            (Language::En, EMBEDDED_EN),
            (Language::Fr, EMBEDDED_FR),
            (Language::De, EMBEDDED_DE),
            (Language::Es, EMBEDDED_ES),
        ];
        let tables = sources
            .into_iter()
            .map(|(lang, json)| (lang, parse_table(lang, json)))
            .collect();
        Self::with_tables(tables)
    }

    /// Load `<code>.json` for every supported language from `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        let tables = Language::ALL
            .into_iter()
            .map(|lang| {
                let path = dir.join(format!("{}.json", lang.code()));
                let table = match std::fs::read_to_string(&path) {
                    Ok(json) => parse_table(lang, &json),
                    Err(e) => {
                        tracing::warn!("Failed to load translation file {:?}: {}", path, e);
                        Translations::new()
                    }
                };
                (lang, table)
            })
            .collect();
        Self::with_tables(tables)
    }

    /// Async variant of [`Localizer::from_dir`].
    pub async fn load_dir(dir: &Path) -> Self {
        let loads = Language::ALL.into_iter().map(|lang| {
            let path = dir.join(format!("{}.json", lang.code()));
            async move {
                let table = match tokio::fs::read_to_string(&path).await {
                    Ok(json) => parse_table(lang, &json),
                    Err(e) => {
                        tracing::warn!("Failed to load translation file {:?}: {}", path, e);
                        Translations::new()
                    }
                };
                (lang, table)
            }
        });
        let mut tables = HashMap::new();
        for load in loads {
            let (lang, table) = load.await;
            tables.insert(lang, table);
        }
        Self::with_tables(tables)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Switch language by code; unsupported codes fall back to the default.
    pub fn set_language_code(&mut self, code: &str) -> Language {
        self.language = Language::from_code_or_default(code);
        self.language
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Number of keys loaded for a language.
    pub fn table_len(&self, language: Language) -> usize {
        self.tables.get(&language).map(|t| t.len()).unwrap_or(0)
    }

    fn raw(&self, language: Language, key: &str) -> Option<&str> {
        self.tables
            .get(&language)
            .and_then(|t| t.get(key))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Resolve `key` and substitute `{name}` placeholders from `vars`.
    pub fn lookup(&self, key: &str, vars: &[(&str, &str)], fallback: Option<&str>) -> String {
        let template = self
            .raw(self.language, key)
            .or_else(|| self.raw(Language::DEFAULT, key))
            .or(fallback)
            .unwrap_or(key);
        interpolate(template, vars)
    }

    pub fn t(&self, key: &str) -> String {
        self.lookup(key, &[], None)
    }

    pub fn t_or(&self, key: &str, fallback: &str) -> String {
        self.lookup(key, &[], Some(fallback))
    }

    /// Display name of a language in the active language.
    pub fn language_name(&self, language: Language) -> String {
        self.t_or(&format!("language.{}", language.code()), language.native_name())
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::embedded()
    }
}

fn parse_table(language: Language, json: &str) -> Translations {
    match serde_json::from_str::<Translations>(json) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Failed to parse {} translations: {}", language.code(), e);
            Translations::new()
        }
    }
}

/// Replace every `{name}` with its value; unknown placeholders stay as-is.
pub fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}
