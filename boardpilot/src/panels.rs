//! Front-end panel models
//!
//! State and behavior of the controls panel and the chat panel, free of
//! any rendering. A front end draws these however it likes and forwards
//! the resulting commands to the [`BoardController`](crate::controller::BoardController).

use serde::Serialize;

use crate::board::PartCategory;
use crate::localization::{Language, Localizer};
use crate::presets::builtin_presets;
use crate::speech::{SpeechError, SpeechRecognizer, Unavailable};

/// Canned AI actions offered as buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    AutoPlace,
    OptimizeThermal,
    SignalIntegrity,
    PowerPaths,
}

impl ControlAction {
    pub const ALL: [ControlAction; 4] = [
        ControlAction::AutoPlace,
        ControlAction::OptimizeThermal,
        ControlAction::SignalIntegrity,
        ControlAction::PowerPaths,
    ];

    fn command_phrase(&self) -> (&'static str, &'static str) {
        match self {
            ControlAction::AutoPlace => ("command.aiAutoPlace", "ai auto-place"),
            ControlAction::OptimizeThermal => ("command.optimizeThermal", "optimize for thermal"),
            ControlAction::SignalIntegrity => ("command.runSignalIntegrity", "run signal integrity"),
            ControlAction::PowerPaths => ("command.analyzePowerPaths", "analyze power paths"),
        }
    }

    fn label_phrase(&self) -> (&'static str, &'static str) {
        match self {
            ControlAction::AutoPlace => ("controls.aiAutoPlace", "AI auto-place components"),
            ControlAction::OptimizeThermal => ("controls.optimizeThermal", "Optimize for thermal management"),
            ControlAction::SignalIntegrity => ("controls.runSignalIntegrity", "Run signal integrity analysis"),
            ControlAction::PowerPaths => ("controls.analyzePowerPaths", "Analyze power paths"),
        }
    }

    /// Chat command this button sends, in the active language.
    pub fn command(&self, localizer: &Localizer) -> String {
        let (key, default) = self.command_phrase();
        localizer.t_or(key, default)
    }

    pub fn label(&self, localizer: &Localizer) -> String {
        let (key, default) = self.label_phrase();
        localizer.t_or(key, default)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "auto_place" | "autoplace" => Some(ControlAction::AutoPlace),
            "thermal" | "optimize_thermal" => Some(ControlAction::OptimizeThermal),
            "signal" | "signal_integrity" => Some(ControlAction::SignalIntegrity),
            "power" | "power_paths" => Some(ControlAction::PowerPaths),
            _ => None,
        }
    }
}

/// One row of the preset picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub part_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ControlsPanel;

impl ControlsPanel {
    pub fn presets(&self, localizer: &Localizer) -> Vec<PresetSummary> {
        builtin_presets()
            .into_iter()
            .map(|p| PresetSummary {
                name: p.display_name(localizer),
                description: p.description(localizer),
                part_count: p.parts.len(),
                id: p.id,
            })
            .collect()
    }

    /// Category choices for manual add, with localized labels.
    pub fn categories(&self, localizer: &Localizer) -> Vec<(PartCategory, String)> {
        PartCategory::ALL
            .into_iter()
            .map(|c| (c, localizer.t_or(&c.translation_key(), c.label())))
            .collect()
    }

    pub fn actions(&self, localizer: &Localizer) -> Vec<(ControlAction, String)> {
        ControlAction::ALL
            .into_iter()
            .map(|a| (a, a.label(localizer)))
            .collect()
    }
}

/// Input line plus voice capture.
pub struct ChatPanel {
    input: String,
    recognizer: Box<dyn SpeechRecognizer>,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            recognizer: Box::new(Unavailable),
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn can_submit(&self, busy: bool) -> bool {
        !busy && !self.input.trim().is_empty()
    }

    /// Take the trimmed input for sending. Blank input or a busy
    /// controller leaves the buffer untouched.
    pub fn submit(&mut self, busy: bool) -> Option<String> {
        if !self.can_submit(busy) {
            return None;
        }
        let text = self.input.trim().to_string();
        self.input.clear();
        Some(text)
    }

    /// Fill the input from one spoken utterance. On failure returns the
    /// notice to show the user.
    pub fn capture_voice(&mut self, language: Language, localizer: &Localizer) -> Result<&str, String> {
        if !self.recognizer.is_available() {
            return Err(localizer.t_or(
                "voice.notSupported",
                "Voice recognition is not supported on this system.",
            ));
        }
        match self.recognizer.listen(language) {
            Ok(transcript) => {
                self.input = transcript;
                Ok(&self.input)
            }
            Err(SpeechError::NotSupported) => Err(localizer.t_or(
                "voice.notSupported",
                "Voice recognition is not supported on this system.",
            )),
            Err(e) => {
                tracing::warn!("Speech recognition failed: {}", e);
                Err(localizer.lookup(
                    "voice.error",
                    &[("error", &e.to_string())],
                    Some("Speech recognition error: {error}"),
                ))
            }
        }
    }
}

impl Default for ChatPanel {
    fn default() -> Self {
        Self::new()
    }
}
