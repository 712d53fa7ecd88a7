//! BoardPilot - interactive PCB arrangement assistant core
//!
//! This library holds everything a front end needs to run the assistant:
//! a board of draggable parts with a click/drag/lock state machine, built-in
//! presets, a chat command dispatcher and an AI gateway that turns natural
//! language into layout suggestions, thermal estimates and advice.
//!
//! # Quick Start
//!
//! ```no_run
//! use boardpilot::{AiConfig, AiGateway, BoardController, Localizer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = AiGateway::from_config(&AiConfig::from_env()?);
//! let mut controller = BoardController::new(Localizer::embedded(), gateway);
//! controller.load_preset("soil_sensor")?;
//!
//! let reply = controller.handle_command("optimize for thermal").await?;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Board interaction**: drag with clamping, double-click lock, sensor click
//! - **Chat commands**: auto-place, place near, thermal, signal integrity, power paths
//! - **Localization**: English, French, German and Spanish string tables
//! - **AI providers**: Gemini over HTTPS or a local Ollama server, with fallback

pub mod ai;
pub mod board;
pub mod controller;
pub mod dispatch;
pub mod localization;
pub mod panels;
pub mod presets;
pub mod settings;
pub mod speech;
pub mod transcript;
pub mod view;
pub mod widget;

// Re-export main types
pub use ai::{AIError, AiConfig, AiGateway, ConfigError, StructuredFailure, StructuredReply};
pub use board::{Bounds, Part, PartCategory, Point, BOARD_HEIGHT, BOARD_WIDTH};
pub use controller::{
    BoardController, BusyFlag, CommandOutcome, ControllerError, LayoutSnapshot, PreparedCommand,
    SensorReading, SensorStatus,
};
pub use dispatch::{classify, Intent};
pub use localization::{Language, Localizer};
pub use panels::{ChatPanel, ControlAction, ControlsPanel, PresetSummary};
pub use presets::{builtin_presets, find_preset, Preset, SOIL_SENSOR_ID};
pub use settings::{AppSettings, SettingsError, SettingsStore, StoredPreferences, SystemHints, Theme};
pub use speech::{SpeechError, SpeechRecognizer, SpeechSynthesizer};
pub use transcript::{ConversationEntry, Sender, Transcript};
pub use view::{BoardView, ViewEvent};
pub use widget::{Clock, ManualClock, PartWidget, SystemClock, WidgetEvent, WidgetState};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AiGateway, BoardController, BoardView, ControllerError, Intent, Language, Localizer, Part,
        PartCategory, Point, Sender, ViewEvent,
    };
}
