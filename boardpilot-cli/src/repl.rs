//! Interactive chat session.
//!
//! Plain lines go to the assistant. Lines starting with `/` drive the board
//! through the same pointer path a graphical front end would use.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use boardpilot::widget::DOUBLE_CLICK_WINDOW;
use boardpilot::{
    BoardController, BoardView, ChatPanel, ControlAction, ControlsPanel, Language, PartCategory,
    Point, ViewEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{print_board, print_entry, Session};

const HELP: &str = "\
Commands:
  /show                   Render the board
  /presets                List presets
  /preset <id>            Load a preset
  /add <category> [name]  Add a part (controller, sensor, power_regulator, ...)
  /drag <id> <x> <y>      Drag a part so its top-left corner lands at x,y
  /lock <id>              Double-click a part to toggle its lock
  /click <id>             Single-click a part (the soil sensor takes a reading)
  /action <name>          Run a control panel action (auto_place, thermal, signal, power)
  /save                   Keep an in-memory version of the board
  /export [file]          Print or write the layout as JSON
  /lang <code>            Switch language (en, fr, de, es)
  /theme                  Toggle light/dark theme
  /voice                  Dictate a message
  /status                 Show AI provider status
  /quit                   Leave the session
Anything else is sent to the assistant.";

enum Flow {
    Continue,
    Quit,
}

pub async fn run(mut session: Session, preset: &str, greet: bool) -> Result<()> {
    let mut controller = session.controller(preset)?;
    let mut view = BoardView::new();
    let mut panel = ChatPanel::new();

    println!("BoardPilot - {} ({})", preset, controller.language().native_name());
    println!("Type /help for commands.\n");

    if greet {
        if let Some(entry) = controller.greet().await? {
            print_entry(entry);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        panel.set_input(line);
        let Some(text) = panel.submit(controller.is_busy()) else {
            continue;
        };

        let flow = if let Some(rest) = text.strip_prefix('/') {
            run_action(rest, &mut session, &mut controller, &mut view, &mut panel).await
        } else {
            send(&mut controller, &text).await
        };

        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    Ok(())
}

async fn send(controller: &mut BoardController, text: &str) -> Result<Flow> {
    let before = controller.transcript().len();
    controller.handle_command(text).await?;
    for entry in controller.transcript().since(before).iter().skip(1) {
        print_entry(entry);
    }
    Ok(Flow::Continue)
}

async fn run_action(
    line: &str,
    session: &mut Session,
    controller: &mut BoardController,
    view: &mut BoardView,
    panel: &mut ChatPanel,
) -> Result<Flow> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match (command, args.as_slice()) {
        ("quit" | "exit" | "q", _) => return Ok(Flow::Quit),
        ("help", _) => println!("{}", HELP),
        ("show", _) => print_board(controller),
        ("presets", _) => {
            for p in ControlsPanel.presets(controller.localizer()) {
                println!("  {:<16} {} ({} parts)", p.id, p.name, p.part_count);
            }
        }
        ("preset", [id]) => {
            controller.load_preset(id)?;
            view.sync(controller.parts());
            print_board(controller);
        }
        ("add", [category, name @ ..]) => {
            let category = PartCategory::parse(category)
                .ok_or_else(|| anyhow::anyhow!("Unknown category '{}'", category))?;
            let name = name.join(" ");
            let part = controller.add_part(category, Some(name.as_str()));
            println!("Added {} ({}) at ({:.0}, {:.0})", part.id, part.name, part.x, part.y);
        }
        ("drag", [id, x, y]) => {
            let target = Point::new(x.parse()?, y.parse()?);
            let from = pointer_target(controller, view, id)?;
            let part = controller
                .part(id)
                .ok_or_else(|| anyhow::anyhow!("Unknown part '{}'", id))?;
            let to = Point::new(target.x + part.width / 2.0, target.y + part.height / 2.0);

            let mut events = view.pointer_down(controller.parts(), from);
            events.extend(view.pointer_move(controller.parts(), to));
            events.extend(view.pointer_up(controller.parts(), to));
            relay(controller, events);

            if let Some(part) = controller.part(id) {
                let note = if part.locked { " (locked)" } else { "" };
                println!("{} at ({:.0}, {:.0}){}", part.id, part.x, part.y, note);
            }
        }
        ("lock", [id]) => {
            let at = pointer_target(controller, view, id)?;
            let events = view.double_activate(controller.parts(), at);
            relay(controller, events);
            if let Some(part) = controller.part(id) {
                println!("{} {}", part.id, if part.locked { "locked" } else { "unlocked" });
            }
        }
        ("click", [id]) => {
            let at = pointer_target(controller, view, id)?;
            let mut events = view.pointer_down(controller.parts(), at);
            events.extend(view.pointer_up(controller.parts(), at));
            tokio::time::sleep(DOUBLE_CLICK_WINDOW + Duration::from_millis(10)).await;
            events.extend(view.poll());

            let before = controller.transcript().len();
            relay(controller, events);
            let entries = controller.transcript().since(before);
            if entries.is_empty() {
                println!("Nothing happened.");
            }
            for entry in entries {
                print_entry(entry);
            }
        }
        ("action", [name]) => {
            let action =
                ControlAction::parse(name).ok_or_else(|| anyhow::anyhow!("Unknown action '{}'", name))?;
            let text = action.command(controller.localizer());
            println!("> {}", text);
            return send(controller, &text).await;
        }
        ("save", _) => {
            let snapshot = controller.save_version();
            let version = snapshot.version.unwrap_or_default().to_string();
            let count = snapshot.parts.len().to_string();
            let text = controller.localizer().lookup(
                "version.saved",
                &[("version", &version), ("count", &count)],
                Some("Saved version {version} with {count} components."),
            );
            println!("{}", text);
        }
        ("export", []) => println!("{}", controller.export_layout_json()?),
        ("export", [path]) => {
            let path = PathBuf::from(path);
            std::fs::write(&path, controller.export_layout_json()?)?;
            let count = controller.parts().len().to_string();
            let text = controller.localizer().lookup(
                "layout.exported",
                &[("count", &count)],
                Some("Layout exported with {count} components."),
            );
            println!("{} ({})", text, path.display());
        }
        ("lang", [code]) => {
            let language = Language::from_code(code)
                .ok_or_else(|| anyhow::anyhow!("Unsupported language '{}'", code))?;
            controller.set_language(language);
            session.settings.language = language;
            session.persist();
            println!("{}", language.native_name());
        }
        ("theme", _) => {
            let theme = session.settings.toggle_theme();
            session.persist();
            println!("Theme: {}", theme.as_str());
        }
        ("voice", _) => {
            let language = controller.language();
            match panel.capture_voice(language, controller.localizer()) {
                Ok(heard) => {
                    let heard = heard.to_string();
                    println!("> {}", heard);
                    return send(controller, &heard).await;
                }
                Err(notice) => {
                    controller.notify(notice.clone());
                    println!("[system] {}", notice);
                }
            }
        }
        ("status", _) => {
            let status = controller.gateway().router().get_status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        _ => println!("Unknown command '/{}'. Type /help for commands.", line),
    }

    Ok(Flow::Continue)
}

/// Centre of `id`, provided the part is the topmost one there. Pointer
/// events at the centre of a covered part would reach the covering one.
fn pointer_target(controller: &BoardController, view: &BoardView, id: &str) -> Result<Point> {
    let at = controller
        .part(id)
        .map(|p| p.center())
        .ok_or_else(|| anyhow::anyhow!("Unknown part '{}'", id))?;
    match view.hit_test(controller.parts(), at) {
        Some(top) if top.id != id => anyhow::bail!("Part '{}' is covered by '{}' at its centre", id, top.id),
        _ => Ok(at),
    }
}

fn relay(controller: &mut BoardController, events: Vec<ViewEvent>) {
    for event in events {
        tracing::debug!("View event: {:?}", event);
        controller.apply_view_event(event);
    }
}
