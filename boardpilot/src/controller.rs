//! Application controller
//!
//! Owns the part list, the chat transcript and the selected preset, and is
//! the only place they change. Chat commands run in three phases so a front
//! end can keep handling pointer input while a completion is in flight:
//!
//! 1. [`BoardController::prepare`] records the user entry, classifies the
//!    command and builds the prompt. It marks the controller busy.
//! 2. [`PreparedCommand::execute`] performs the external call without
//!    borrowing the controller.
//! 3. [`BoardController::apply`] merges the reply into the board and appends
//!    exactly one assistant entry. The busy mark is released when the
//!    outcome is consumed or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::ai::gateway::{AiGateway, StructuredReply};
use crate::ai::prompts::{
    build_advisory_prompt, build_auto_place_prompt, build_place_near_prompt, build_power_path_prompt,
    build_signal_integrity_prompt, build_thermal_prompt, ASSISTANT_NAME,
};
use crate::board::{apply_suggested_position, Part, PartCategory, Point, BOARD_HEIGHT, BOARD_WIDTH};
use crate::dispatch::{classify, parse_place_near, Intent, PlaceNear};
use crate::localization::{Language, Localizer};
use crate::presets::{find_preset, SOIL_SENSOR_ID};
use crate::speech::{SpeechError, SpeechSynthesizer, Unavailable};
use crate::transcript::{ConversationEntry, Sender, Transcript};
use crate::view::ViewEvent;

/// Probability that a heat-source part is flagged by the fallback thermal simulation.
pub const FALLBACK_HOTSPOT_PROBABILITY: f64 = 0.3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Another command is still being processed")]
    Busy,
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
    #[error("Unknown part: {0}")]
    UnknownPart(String),
}

/// Shared "a command is in flight" flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Mark busy, or `None` if already busy.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(self.0.clone()))
    }
}

/// Clears the busy flag on drop.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Dry,
    Optimal,
    Overwatered,
}

impl SensorStatus {
    pub fn from_moisture(moisture: u8) -> Self {
        if moisture < 30 {
            SensorStatus::Dry
        } else if moisture > 70 {
            SensorStatus::Overwatered
        } else {
            SensorStatus::Optimal
        }
    }

    pub fn status_key(&self) -> &'static str {
        match self {
            SensorStatus::Dry => "sensorModal.status.dry",
            SensorStatus::Optimal => "sensorModal.status.optimal",
            SensorStatus::Overwatered => "sensorModal.status.overwatered",
        }
    }

    pub fn voice_key(&self) -> &'static str {
        match self {
            SensorStatus::Dry => "sensorTest.voice.dry",
            SensorStatus::Optimal => "sensorTest.voice.optimal",
            SensorStatus::Overwatered => "sensorTest.voice.overwatered",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SensorStatus::Dry => "Dry",
            SensorStatus::Optimal => "Optimal",
            SensorStatus::Overwatered => "Overwatered",
        }
    }
}

/// One simulated moisture reading. Not stored on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub part_id: String,
    pub part_name: String,
    pub moisture: u8,
    pub status: SensorStatus,
    /// Status in the active language
    pub status_text: String,
    pub taken_at: DateTime<Local>,
}

/// Serializable copy of the board at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    pub board_width: f64,
    pub board_height: f64,
    pub created_at: DateTime<Utc>,
    pub parts: Vec<Part>,
}

enum Job {
    /// Handled entirely in `apply`.
    Local,
    /// Reply already known at prepare time.
    Reply(String),
    Text(String),
    Structured(String),
}

enum JobResult {
    Local,
    Reply(String),
    Text(String),
    Structured(StructuredReply),
}

/// A classified command waiting for its external call.
pub struct PreparedCommand {
    intent: Intent,
    language: Language,
    job: Job,
    gateway: Arc<AiGateway>,
    guard: BusyGuard,
}

impl PreparedCommand {
    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn calls_ai(&self) -> bool {
        matches!(self.job, Job::Text(_) | Job::Structured(_))
    }

    pub async fn execute(self) -> CommandOutcome {
        let PreparedCommand {
            intent,
            language,
            job,
            gateway,
            guard,
        } = self;

        let result = match job {
            Job::Local => JobResult::Local,
            Job::Reply(text) => JobResult::Reply(text),
            Job::Text(prompt) => JobResult::Text(gateway.generate_text(&prompt, language).await),
            Job::Structured(prompt) => JobResult::Structured(gateway.generate_structured(&prompt, language).await),
        };

        CommandOutcome { intent, result, guard }
    }
}

/// Result of [`PreparedCommand::execute`], ready to be applied.
pub struct CommandOutcome {
    intent: Intent,
    result: JobResult,
    guard: BusyGuard,
}

impl CommandOutcome {
    pub fn intent(&self) -> Intent {
        self.intent
    }
}

pub struct BoardController {
    parts: Vec<Part>,
    transcript: Transcript,
    selected_preset: Option<String>,
    localizer: Localizer,
    gateway: Arc<AiGateway>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    rng: StdRng,
    busy: BusyFlag,
    versions: Vec<LayoutSnapshot>,
}

impl BoardController {
    pub fn new(localizer: Localizer, gateway: AiGateway) -> Self {
        Self {
            parts: Vec::new(),
            transcript: Transcript::new(),
            selected_preset: None,
            localizer,
            gateway: Arc::new(gateway),
            synthesizer: Box::new(Unavailable),
            rng: StdRng::from_entropy(),
            busy: BusyFlag::default(),
            versions: Vec::new(),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Deterministic randomness for placement, readings and fallbacks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Start from an explicit part list. Positions are clamped.
    pub fn with_parts(mut self, parts: Vec<Part>) -> Self {
        self.parts = parts
            .into_iter()
            .map(|mut p| {
                p.set_position(p.x, p.y);
                p
            })
            .collect();
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn selected_preset(&self) -> Option<&str> {
        self.selected_preset.as_deref()
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    pub fn language(&self) -> Language {
        self.localizer.language()
    }

    pub fn set_language(&mut self, language: Language) {
        tracing::info!("Switching language to {}", language);
        self.localizer.set_language(language);
    }

    pub fn gateway(&self) -> &AiGateway {
        &self.gateway
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn versions(&self) -> &[LayoutSnapshot] {
        &self.versions
    }

    fn say(&self, key: &str, default: &str) -> String {
        self.localizer.lookup(key, &[], Some(default))
    }

    /// Replace the whole part list with a preset's template.
    pub fn load_preset(&mut self, id: &str) -> Result<&[Part], ControllerError> {
        let preset = find_preset(id).ok_or_else(|| ControllerError::UnknownPreset(id.to_string()))?;
        self.parts = preset.instantiate(&self.localizer);
        self.selected_preset = Some(preset.id);
        tracing::info!("Loaded preset {} with {} parts", id, self.parts.len());
        Ok(&self.parts)
    }

    /// Add a part at a random position away from the board edges.
    pub fn add_part(&mut self, category: PartCategory, name: Option<&str>) -> &Part {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => self
                .localizer
                .t_or(&category.translation_key(), &format!("New {}", category.label())),
        };
        let position = Point::new(self.rng.gen_range(50.0..350.0), self.rng.gen_range(50.0..250.0));
        let part = Part::new(
            format!("comp-{}", Uuid::new_v4()),
            name,
            category,
            position,
            category.default_size(),
        );
        tracing::debug!("Added part {} at ({:.0}, {:.0})", part.id, part.x, part.y);
        self.parts.push(part);
        &self.parts[self.parts.len() - 1]
    }

    /// Move a part, clamped to the board. Locked parts stay where they are.
    pub fn move_part(&mut self, id: &str, x: f64, y: f64) -> Result<Point, ControllerError> {
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ControllerError::UnknownPart(id.to_string()))?;
        if part.locked {
            return Ok(part.position());
        }
        Ok(part.set_position(x, y))
    }

    /// Flip the lock flag. Returns the new value.
    pub fn toggle_lock(&mut self, id: &str) -> Result<bool, ControllerError> {
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ControllerError::UnknownPart(id.to_string()))?;
        part.locked = !part.locked;
        Ok(part.locked)
    }

    /// Apply one event relayed by the board view.
    pub fn apply_view_event(&mut self, event: ViewEvent) -> Option<SensorReading> {
        match event {
            ViewEvent::Moved { id, position } => {
                if let Err(e) = self.move_part(&id, position.x, position.y) {
                    tracing::debug!("Ignoring move: {}", e);
                }
                None
            }
            ViewEvent::LockToggled { id } => {
                if let Err(e) = self.toggle_lock(&id) {
                    tracing::debug!("Ignoring lock toggle: {}", e);
                }
                None
            }
            ViewEvent::SensorClicked { id } => self.sensor_interaction(&id),
        }
    }

    /// Take a simulated reading from a sensor part, log it and speak it.
    pub fn sensor_interaction(&mut self, id: &str) -> Option<SensorReading> {
        let part = self.part(id)?;
        let part_id = part.id.clone();
        let part_name = part.name.clone();

        let moisture: u8 = self.rng.gen_range(0..=100);
        let status = SensorStatus::from_moisture(moisture);
        let status_text = self.say(status.status_key(), status.label());
        let taken_at = Local::now();

        let log = self.localizer.lookup(
            "sensorTest.triggeredLog",
            &[
                ("sensorName", &part_name),
                ("timestamp", &taken_at.format("%H:%M:%S").to_string()),
                ("moisture", &moisture.to_string()),
                ("status", &status_text),
            ],
            Some("Sensor {sensorName} tested at {timestamp}: moisture {moisture}%, status {status}."),
        );
        self.transcript.push(
            ConversationEntry::new(Sender::System, log)
                .with_metadata(json!({ "sensor_id": part_id, "moisture": moisture })),
        );

        let voice = self.say(status.voice_key(), status.label());
        self.speak(&voice);

        Some(SensorReading {
            part_id,
            part_name,
            moisture,
            status,
            status_text,
            taken_at,
        })
    }

    fn speak(&mut self, text: &str) {
        match self.synthesizer.speak(text, self.localizer.language()) {
            Ok(()) => {}
            Err(SpeechError::NotSupported) => {
                tracing::warn!("Speech synthesis not supported");
                let notice = self.say(
                    "speech.notSupported",
                    "System: Speech synthesis not supported. Cannot provide voice feedback.",
                );
                self.notify(notice);
            }
            Err(e) => tracing::warn!("Speech synthesis failed: {}", e),
        }
    }

    /// Append a system entry.
    pub fn notify(&mut self, text: impl Into<String>) -> &ConversationEntry {
        self.transcript.push(ConversationEntry::new(Sender::System, text))
    }

    /// Phase one: record and classify a user command.
    pub fn prepare(&mut self, text: &str) -> Result<PreparedCommand, ControllerError> {
        self.prepare_inner(text, true)
    }

    fn prepare_inner(&mut self, text: &str, record_user: bool) -> Result<PreparedCommand, ControllerError> {
        let guard = self.busy.try_acquire().ok_or(ControllerError::Busy)?;

        if record_user {
            self.transcript.push(ConversationEntry::new(Sender::User, text));
        }

        let command = text.trim();
        let intent = classify(command, &self.localizer);
        let language = self.localizer.language();
        let lang_name = language.english_name();

        let job = match intent {
            Intent::AutoPlace => Job::Structured(build_auto_place_prompt(&self.parts, lang_name)),
            Intent::OptimizeThermal => Job::Structured(build_thermal_prompt(&self.parts, lang_name)),
            Intent::SignalIntegrity => Job::Text(build_signal_integrity_prompt(&self.parts, lang_name)),
            Intent::PowerPaths => Job::Text(build_power_path_prompt(&self.parts, lang_name)),
            Intent::PlaceNear => self.plan_place_near(command, lang_name),
            Intent::ClearBoard | Intent::AddComponent | Intent::TestSoilSensor => Job::Local,
            Intent::Advisory => {
                let org = self.say("org.shortName", ASSISTANT_NAME);
                Job::Text(build_advisory_prompt(command, &org, lang_name))
            }
        };

        Ok(PreparedCommand {
            intent,
            language,
            job,
            gateway: self.gateway.clone(),
            guard,
        })
    }

    fn plan_place_near(&self, command: &str, lang_name: &str) -> Job {
        let (target, anchor) = match parse_place_near(command, &self.localizer) {
            PlaceNear::Names { target, anchor } => (target, anchor),
            PlaceNear::InvalidFormat => {
                return Job::Reply(self.say(
                    "airesponse.placeComponentsInvalidFormat",
                    "Invalid format for 'place' command. Use: 'place [comp1] near [comp2]'.",
                ))
            }
        };

        let find = |name: &str| {
            let name = name.to_lowercase();
            self.parts.iter().find(|p| p.name.to_lowercase() == name)
        };

        match (find(&target), find(&anchor)) {
            (Some(t), Some(a)) => Job::Structured(build_place_near_prompt(&self.parts, t, a, lang_name)),
            _ => Job::Reply(self.localizer.lookup(
                "airesponse.placeComponentsNotFound",
                &[("name1", &target), ("name2", &anchor)],
                Some("Could not find components '{name1}' or '{name2}'."),
            )),
        }
    }

    /// Phase three: merge a reply and append the assistant entry.
    pub fn apply(&mut self, outcome: CommandOutcome) -> &ConversationEntry {
        let CommandOutcome { intent, result, guard } = outcome;

        let text = match (intent, result) {
            (_, JobResult::Reply(text)) => text,
            (Intent::ClearBoard, _) => {
                self.parts.clear();
                self.say("airesponse.clearingBoard", "Clearing the PCB components.")
            }
            (Intent::AddComponent, _) => self.say(
                "airesponse.addComponentGeneralFail",
                "Failed to add component. Please use the controls panel or a more specific command format.",
            ),
            (Intent::TestSoilSensor, _) => {
                if self.sensor_interaction(SOIL_SENSOR_ID).is_some() {
                    self.say(
                        "airesponse.testingSoilSensor",
                        "Testing the soil sensor now. Check the sensor reading for results.",
                    )
                } else {
                    self.say(
                        "airesponse.soilSensorNotFound",
                        "The 'Moisture Probe' sensor is not currently on the PCB. Please add it or select a preset that includes it.",
                    )
                }
            }
            (Intent::AutoPlace, JobResult::Structured(reply)) => self.apply_layout_reply(
                &reply,
                false,
                ("airesponse.autoPlaceSuccess", "AI has suggested a new layout. Check the PCB view."),
                ("airesponse.autoPlaceFail", "AI auto-placement failed. {error} Details: {details}"),
            ),
            (Intent::PlaceNear, JobResult::Structured(reply)) => self.apply_layout_reply(
                &reply,
                true,
                ("airesponse.placeComponentsSuccess", "AI has attempted to move components. Check layout."),
                (
                    "airesponse.placeComponentsFail",
                    "AI component placement failed. Error: {error} Details: {details}",
                ),
            ),
            (Intent::OptimizeThermal, JobResult::Structured(reply)) => self.apply_thermal_reply(&reply),
            (Intent::SignalIntegrity, JobResult::Text(text)) => self.non_empty_or(
                text,
                "airesponse.signalIntegrityFail",
                "Signal integrity analysis could not be performed by AI.",
            ),
            (Intent::PowerPaths, JobResult::Text(text)) => self.non_empty_or(
                text,
                "airesponse.powerPathFail",
                "Power path analysis could not be performed by AI.",
            ),
            (_, JobResult::Text(text)) => {
                self.non_empty_or(text, "airesponse.genericFail", "Sorry, I couldn't process that generic request.")
            }
            (_, JobResult::Structured(_)) | (_, JobResult::Local) => {
                self.say("airesponse.genericFail", "Sorry, I couldn't process that generic request.")
            }
        };

        drop(guard);
        self.transcript
            .push(ConversationEntry::new(Sender::Assistant, text).with_metadata(json!({ "intent": intent })))
    }

    /// All three phases in one call.
    pub async fn handle_command(&mut self, text: &str) -> Result<&ConversationEntry, ControllerError> {
        let prepared = self.prepare(text)?;
        let outcome = prepared.execute().await;
        Ok(self.apply(outcome))
    }

    /// Send the localized greeting through the advisory path when the
    /// transcript is still empty. No user entry is recorded.
    pub async fn greet(&mut self) -> Result<Option<&ConversationEntry>, ControllerError> {
        if !self.transcript.is_empty() {
            return Ok(None);
        }
        let greeting = self.say(
            "chatbot.initialGreeting",
            "Hello! I'm BoardPilot, your AI assistant for PCB optimization.",
        );
        let prepared = self.prepare_inner(&greeting, false)?;
        let outcome = prepared.execute().await;
        Ok(Some(self.apply(outcome)))
    }

    fn non_empty_or(&self, text: String, key: &str, default: &str) -> String {
        if text.trim().is_empty() {
            self.say(key, default)
        } else {
            text
        }
    }

    fn apply_layout_reply(
        &mut self,
        reply: &StructuredReply,
        require_entries: bool,
        success: (&str, &str),
        failure: (&str, &str),
    ) -> String {
        match reply.value().and_then(Value::as_array) {
            Some(updates) if !(require_entries && updates.is_empty()) => {
                let applied = self.apply_layout(updates);
                tracing::info!("Applied {} of {} suggested positions", applied, updates.len());
                self.say(success.0, success.1)
            }
            _ => {
                let f = reply.failure();
                self.localizer
                    .lookup(failure.0, &[("error", &f.error), ("details", &f.details)], Some(failure.1))
            }
        }
    }

    /// Best-effort batch move. Malformed entries, unknown ids and locked
    /// parts are skipped; the rest are clamped.
    fn apply_layout(&mut self, updates: &[Value]) -> usize {
        updates
            .iter()
            .filter_map(|u| {
                let id = u.get("id")?.as_str()?;
                let x = u.get("x")?.as_f64()?;
                let y = u.get("y")?.as_f64()?;
                Some((id, x, y))
            })
            .filter(|(id, x, y)| apply_suggested_position(&mut self.parts, id, *x, *y))
            .count()
    }

    fn apply_thermal_reply(&mut self, reply: &StructuredReply) -> String {
        let parsed = reply.value().and_then(|v| {
            let hotspots: Vec<String> = v
                .get("hotspots")?
                .as_array()?
                .iter()
                .filter_map(|h| h.as_str().map(str::to_string))
                .collect();
            let advice = v.get("advice")?.as_str()?.trim().to_string();
            (!advice.is_empty()).then_some((hotspots, advice))
        });

        match parsed {
            Some((hotspots, advice)) => {
                for part in self.parts.iter_mut() {
                    part.thermal_hotspot = hotspots.contains(&part.id);
                }
                let listed = if hotspots.is_empty() {
                    self.say("status.none", "None")
                } else {
                    hotspots.join(", ")
                };
                self.localizer.lookup(
                    "airesponse.thermalSuccess",
                    &[("hotspots", &listed), ("advice", &advice)],
                    Some("Thermal analysis complete. Hotspots: {hotspots}. {advice}"),
                )
            }
            None => {
                let f = reply.failure();
                let mut text = self.localizer.lookup(
                    "airesponse.thermalFail",
                    &[("error", &f.error), ("details", &f.details)],
                    Some("Thermal analysis failed. Error: {error} Details: {details}"),
                );
                self.simulate_hotspots();
                let note = self.say("status.fallbackUsed", "Used fallback thermal simulation");
                text.push_str(&format!(" ({})", note));
                text
            }
        }
    }

    fn simulate_hotspots(&mut self) {
        for part in self.parts.iter_mut() {
            part.thermal_hotspot =
                part.category.is_heat_source() && self.rng.gen_bool(FALLBACK_HOTSPOT_PROBABILITY);
        }
    }

    pub fn export_layout(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            version: None,
            preset: self.selected_preset.clone(),
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            created_at: Utc::now(),
            parts: self.parts.clone(),
        }
    }

    pub fn export_layout_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export_layout())
    }

    /// Keep an in-memory copy of the current board. Versions start at 1.
    pub fn save_version(&mut self) -> &LayoutSnapshot {
        let mut snapshot = self.export_layout();
        snapshot.version = Some(self.versions.len() + 1);
        self.versions.push(snapshot);
        &self.versions[self.versions.len() - 1]
    }
}
