//! BoardPilot CLI - drive the PCB arrangement assistant from the terminal.

mod repl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use boardpilot::ai::AiConfig;
use boardpilot::speech::{SpeechError, SpeechSynthesizer};
use boardpilot::view::{hotspot_overlays, render_text};
use boardpilot::{
    AiGateway, AppSettings, BoardController, ConversationEntry, ControlsPanel, Language, Localizer,
    Sender, SettingsStore, StoredPreferences, SystemHints,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boardpilot")]
#[command(about = "AI-assisted PCB arrangement from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Interface language (en, fr, de, es). Overrides stored preferences.
    #[arg(long, global = true, value_name = "CODE")]
    lang: Option<String>,

    /// Preferences file to read and write
    #[arg(long, global = true, value_name = "FILE")]
    prefs: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in presets
    Presets {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Render a preset's board
    Show {
        /// Preset to load
        #[arg(short, long, default_value = "soil_sensor")]
        preset: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Send one chat command and print the replies
    Ask {
        /// Command text, e.g. "optimize for thermal"
        #[arg(value_name = "TEXT", required = true, num_args = 1..)]
        text: Vec<String>,

        /// Preset to load first
        #[arg(short, long, default_value = "soil_sensor")]
        preset: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Interactive session. Lines starting with '/' are board actions.
    Chat {
        /// Preset to load first
        #[arg(short, long, default_value = "soil_sensor")]
        preset: String,

        /// Skip the assistant's opening greeting
        #[arg(long)]
        no_greeting: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

/// Speaks by printing to stdout.
pub(crate) struct ConsoleVoice;

impl SpeechSynthesizer for ConsoleVoice {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, text: &str, _language: Language) -> Result<(), SpeechError> {
        println!("  (voice) {}", text);
        Ok(())
    }
}

/// Everything a subcommand needs, resolved once.
pub(crate) struct Session {
    pub settings: AppSettings,
    pub store: Option<SettingsStore>,
    pub localizer: Localizer,
}

impl Session {
    fn open(lang: Option<&str>, prefs: Option<&Path>) -> Self {
        let store = match prefs {
            Some(path) => Some(SettingsStore::new(path)),
            None => match SettingsStore::open_default() {
                Ok(store) => Some(store),
                Err(e) => {
                    tracing::warn!("Preferences unavailable: {}", e);
                    None
                }
            },
        };

        let stored = store
            .as_ref()
            .map(|s| {
                s.load().unwrap_or_else(|e| {
                    tracing::warn!("Ignoring preferences file: {}", e);
                    StoredPreferences::default()
                })
            })
            .unwrap_or_default();

        let mut settings = AppSettings::resolve(&stored, &SystemHints::detect());
        if let Some(code) = lang {
            settings.language = Language::from_code_or_default(code);
        }

        let localizer = Localizer::embedded().with_language(settings.language);
        Self {
            settings,
            store,
            localizer,
        }
    }

    fn controller(&self, preset: &str) -> Result<BoardController> {
        let config = AiConfig::from_env().context("Invalid AI configuration")?;
        let mut controller = BoardController::new(self.localizer.clone(), AiGateway::from_config(&config))
            .with_synthesizer(Box::new(ConsoleVoice));
        controller
            .load_preset(preset)
            .with_context(|| format!("Cannot load preset '{}'", preset))?;
        Ok(controller)
    }

    pub fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.settings.to_stored()) {
                eprintln!("Warning: could not save preferences: {}", e);
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = Session::open(cli.lang.as_deref(), cli.prefs.as_deref());

    match cli.command {
        Commands::Presets { format } => handle_presets(&session, format),
        Commands::Show { preset, format } => handle_show(&session, &preset, format),
        Commands::Ask { text, preset, format } => handle_ask(&session, &text.join(" "), &preset, format).await,
        Commands::Chat { preset, no_greeting } => repl::run(session, &preset, !no_greeting).await,
    }
}

fn handle_presets(session: &Session, format: OutputFormat) -> Result<()> {
    let presets = ControlsPanel.presets(&session.localizer);
    match format {
        OutputFormat::Human => {
            println!("Available presets:\n");
            for p in &presets {
                println!("  {}", p.id);
                println!("    {} ({} parts)", p.name, p.part_count);
                if !p.description.is_empty() {
                    println!("    {}", p.description);
                }
                println!();
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&presets)?),
    }
    Ok(())
}

fn handle_show(session: &Session, preset: &str, format: OutputFormat) -> Result<()> {
    let controller = session.controller(preset)?;
    match format {
        OutputFormat::Human => print_board(&controller),
        OutputFormat::Json => println!("{}", controller.export_layout_json()?),
    }
    Ok(())
}

async fn handle_ask(session: &Session, text: &str, preset: &str, format: OutputFormat) -> Result<()> {
    let mut controller = session.controller(preset)?;
    let before = controller.transcript().len();
    controller.handle_command(text).await?;
    let entries = controller.transcript().since(before);

    match format {
        OutputFormat::Human => {
            for entry in entries {
                print_entry(entry);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "language": controller.language(),
                "entries": entries,
                "layout": controller.export_layout(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

pub(crate) fn print_entry(entry: &ConversationEntry) {
    match entry.sender {
        Sender::User => println!("> {}", entry.text),
        Sender::Assistant => println!("[assistant] {}", entry.text),
        Sender::System => println!("[system] {}", entry.text),
    }
}

pub(crate) fn print_board(controller: &BoardController) {
    print!("{}", render_text(controller.parts(), 50, 14));
    let overlays = hotspot_overlays(controller.parts());
    if !overlays.is_empty() {
        let ids: Vec<&str> = overlays.iter().map(|o| o.part_id.as_str()).collect();
        println!("  hotspots: {}", ids.join(", "));
    }
}
