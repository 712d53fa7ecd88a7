//! Scripted session: load a preset, drag and lock parts, then send a few
//! chat commands. Uses Gemini or Ollama when configured through the
//! environment, otherwise shows the "not configured" replies.

use boardpilot::prelude::*;
use boardpilot::view::render_text;
use boardpilot::AiConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let language = std::env::args()
        .nth(1)
        .map(|code| Language::from_code_or_default(&code))
        .unwrap_or_default();

    let gateway = AiGateway::from_config(&AiConfig::from_env()?);
    let localizer = Localizer::embedded().with_language(language);
    let mut controller = BoardController::new(localizer, gateway);
    controller.load_preset("soil_sensor")?;

    let mut view = BoardView::new();
    let at = controller.part("ss_power").map(|p| p.center()).unwrap_or_default();
    let to = Point::new(at.x + 150.0, at.y + 60.0);
    let mut events = view.pointer_down(controller.parts(), at);
    events.extend(view.pointer_move(controller.parts(), to));
    events.extend(view.pointer_up(controller.parts(), to));
    let mcu = controller.part("ss_mcu").map(|p| p.center()).unwrap_or_default();
    events.extend(view.double_activate(controller.parts(), mcu));
    for event in events {
        controller.apply_view_event(event);
    }

    println!("{}", render_text(controller.parts(), 50, 14));

    for command in ["optimize for thermal", "place LDO near TinyMCU", "test soil sensor"] {
        let before = controller.transcript().len();
        controller.handle_command(command).await?;
        for entry in controller.transcript().since(before) {
            println!("[{}] {}", entry.sender.as_str(), entry.text);
        }
        println!();
    }

    let snapshot = controller.save_version();
    println!(
        "Saved version {} with {} parts",
        snapshot.version.unwrap_or_default(),
        snapshot.parts.len()
    );
    Ok(())
}
