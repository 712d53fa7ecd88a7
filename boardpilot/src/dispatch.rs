//! Chat command dispatch
//!
//! Commands are matched against an ordered table; the first rule whose
//! localized phrase matches wins and anything else is an advisory query.
//! The table is language-independent: each rule names an intent, a matcher
//! and translation keys, and the phrases are resolved through the
//! [`Localizer`] with English defaults.

use serde::Serialize;

use crate::localization::Localizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AutoPlace,
    OptimizeThermal,
    SignalIntegrity,
    PowerPaths,
    PlaceNear,
    ClearBoard,
    AddComponent,
    TestSoilSensor,
    Advisory,
}

impl Intent {
    /// Whether handling this intent calls the AI service.
    pub fn needs_ai(&self) -> bool {
        matches!(
            self,
            Intent::AutoPlace
                | Intent::OptimizeThermal
                | Intent::SignalIntegrity
                | Intent::PowerPaths
                | Intent::PlaceNear
                | Intent::Advisory
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Prefix,
    Contains,
}

/// A translation key and the phrase used when no table has it.
#[derive(Debug, Clone, Copy)]
pub struct Phrase {
    pub key: &'static str,
    pub default: &'static str,
}

const fn phrase(key: &'static str, default: &'static str) -> Phrase {
    Phrase { key, default }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandRule {
    pub intent: Intent,
    pub matcher: Matcher,
    pub phrases: &'static [Phrase],
}

pub const PLACE_PREFIX: Phrase = phrase("command.place", "place ");
pub const NEAR_KEYWORD: Phrase = phrase("command.nearKeyword", " near ");

/// Dispatch order. First match wins.
pub const COMMAND_TABLE: &[CommandRule] = &[
    CommandRule {
        intent: Intent::AutoPlace,
        matcher: Matcher::Prefix,
        phrases: &[phrase("command.aiAutoPlace", "ai auto-place")],
    },
    CommandRule {
        intent: Intent::OptimizeThermal,
        matcher: Matcher::Contains,
        phrases: &[phrase("command.optimizeThermal", "optimize for thermal")],
    },
    CommandRule {
        intent: Intent::SignalIntegrity,
        matcher: Matcher::Contains,
        phrases: &[phrase("command.runSignalIntegrity", "run signal integrity")],
    },
    CommandRule {
        intent: Intent::PowerPaths,
        matcher: Matcher::Contains,
        phrases: &[phrase("command.analyzePowerPaths", "analyze power paths")],
    },
    CommandRule {
        intent: Intent::PlaceNear,
        matcher: Matcher::Prefix,
        phrases: &[PLACE_PREFIX],
    },
    CommandRule {
        intent: Intent::ClearBoard,
        matcher: Matcher::Contains,
        phrases: &[
            phrase("command.clearBoard", "clear board"),
            phrase("command.clearPcb", "clear pcb"),
        ],
    },
    CommandRule {
        intent: Intent::AddComponent,
        matcher: Matcher::Prefix,
        phrases: &[phrase("command.addComponentPrefix", "add component:")],
    },
    CommandRule {
        intent: Intent::TestSoilSensor,
        matcher: Matcher::Contains,
        phrases: &[phrase("command.testSoilSensor", "test soil sensor")],
    },
];

fn resolve(localizer: &Localizer, p: Phrase) -> String {
    localizer.lookup(p.key, &[], Some(p.default))
}

impl CommandRule {
    pub fn matches(&self, text: &str, localizer: &Localizer) -> bool {
        self.phrases.iter().any(|p| {
            let phrase = resolve(localizer, *p);
            if phrase.is_empty() {
                return false;
            }
            match self.matcher {
                Matcher::Prefix => strip_prefix_ci(text, &phrase).is_some(),
                Matcher::Contains => find_ci(text, &phrase).is_some(),
            }
        })
    }
}

/// Classify a chat command in the localizer's active language.
pub fn classify(text: &str, localizer: &Localizer) -> Intent {
    let intent = COMMAND_TABLE
        .iter()
        .find(|rule| rule.matches(text, localizer))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Advisory);
    tracing::debug!("Classified {:?} as {:?}", text, intent);
    intent
}

/// Outcome of parsing a `place X near Y` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceNear {
    Names { target: String, anchor: String },
    InvalidFormat,
}

/// Split `place <target> near <anchor>`. The near keyword must occur exactly once.
pub fn parse_place_near(text: &str, localizer: &Localizer) -> PlaceNear {
    let prefix = resolve(localizer, PLACE_PREFIX);
    let near = resolve(localizer, NEAR_KEYWORD);

    let Some(rest) = strip_prefix_ci(text, &prefix) else {
        return PlaceNear::InvalidFormat;
    };
    let Some(at) = find_ci(rest, &near) else {
        return PlaceNear::InvalidFormat;
    };
    let after = at + matched_len(&rest[at..], &near).unwrap_or(near.len());
    if find_ci(&rest[after..], &near).is_some() {
        return PlaceNear::InvalidFormat;
    }

    PlaceNear::Names {
        target: rest[..at].trim().to_string(),
        anchor: rest[after..].trim().to_string(),
    }
}

/// Bytes of `haystack` consumed when it starts with `needle`, ignoring case.
fn matched_len(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut consumed = 0;
    let mut hay = haystack.chars();
    for n in needle.chars() {
        let h = hay.next()?;
        if !h.to_lowercase().eq(n.to_lowercase()) {
            return None;
        }
        consumed += h.len_utf8();
    }
    Some(consumed)
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    matched_len(text, prefix).map(|n| &text[n..])
}

/// Byte offset of the first case-insensitive occurrence of `needle`.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| matched_len(&haystack[i..], needle).is_some())
}
