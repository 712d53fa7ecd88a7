//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Build a command for the boardpilot-cli binary with no AI provider
/// configured, English output and a throwaway preferences file.
fn boardpilot_cli(prefs: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("boardpilot-cli");
    for key in [
        "GEMINI_API_KEY",
        "API_KEY",
        "BOARDPILOT_AI_PROVIDER",
        "BOARDPILOT_MODEL",
        "BOARDPILOT_REQUEST_TIMEOUT_SECS",
        "OLLAMA_URL",
        "OLLAMA_MODEL",
        "COLORFGBG",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd.arg("--prefs").arg(prefs.path().join("preferences.toml"));
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PCB"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_presets() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "presets"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("soil_sensor"))
        .stdout(predicate::str::contains("irrigation_timer"))
        .stdout(predicate::str::contains("drone_monitor"));
}

#[test]
fn test_cli_presets_json() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "presets", "--format", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let presets: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let ids: Vec<&str> = presets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["soil_sensor", "irrigation_timer", "drone_monitor"]);
}

#[test]
fn test_cli_show_board() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "show", "--preset", "soil_sensor"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ss_mcu"))
        .stdout(predicate::str::contains("TinyMCU"));
}

#[test]
fn test_cli_show_json_layout() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "show", "--preset", "irrigation_timer", "-f", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let layout: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(layout["preset"], "irrigation_timer");
    assert_eq!(layout["board_width"], 500.0);
    assert_eq!(layout["parts"].as_array().unwrap().len(), 4);
}

#[test]
fn test_cli_unknown_preset_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["show", "--preset", "toaster"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("toaster"));
}

#[test]
fn test_cli_ask_clear_board() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "ask", "clear", "board"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("> clear board"))
        .stdout(predicate::str::contains("[assistant] Clearing the PCB components."));
}

#[test]
fn test_cli_ask_json_reports_empty_board() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "ask", "clear board", "--format", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let reply: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let entries = reply["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["sender"], "user");
    assert_eq!(entries[1]["sender"], "assistant");
    assert!(reply["layout"]["parts"].as_array().unwrap().is_empty());
}

#[test]
fn test_cli_ask_without_provider() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "ask", "what is a ground plane?"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("AI API key not configured"));
}

#[test]
fn test_cli_ask_in_french() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "fr", "ask", "vider la carte"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Suppression des composants du PCB."));
}

#[test]
fn test_cli_chat_lock_and_drag() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "chat", "--no-greeting"])
        .write_stdin("/drag ss_mcu 200 100\n/lock ss_mcu\n/drag ss_mcu 10 10\n/quit\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ss_mcu at (200, 100)"))
        .stdout(predicate::str::contains("ss_mcu locked"))
        .stdout(predicate::str::contains("ss_mcu at (200, 100) (locked)"));
}

#[test]
fn test_cli_chat_covered_part_is_not_dragged() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    // the power part ends up on top of the MCU's centre
    cmd.args(["--lang", "en", "chat", "--no-greeting"])
        .write_stdin("/drag ss_power 35 35\n/drag ss_mcu 200 200\n/lock ss_mcu\n/quit\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ss_power at (35, 35)"))
        .stdout(predicate::str::contains("ss_power at (200, 200)").not())
        .stdout(predicate::str::contains("ss_mcu at").not())
        .stdout(predicate::str::contains("ss_mcu locked").not())
        .stderr(predicate::str::contains("Part 'ss_mcu' is covered by 'ss_power'"));
}

#[test]
fn test_cli_chat_click_sensor() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "chat", "--no-greeting"])
        .write_stdin("/click ss_sensor\n/quit\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("(voice)"))
        .stdout(predicate::str::contains("moisture"));
}

#[test]
fn test_cli_chat_theme_is_persisted() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "chat", "--no-greeting"])
        .write_stdin("/theme\n/quit\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Theme: dark"));

    let saved = std::fs::read_to_string(dir.path().join("preferences.toml")).unwrap();
    assert!(saved.contains("theme = \"dark\""));
    assert!(saved.contains("language = \"en\""));
}

#[test]
fn test_cli_chat_unknown_command() {
    let dir = TempDir::new().unwrap();
    let mut cmd = boardpilot_cli(&dir);

    cmd.args(["--lang", "en", "chat", "--no-greeting"])
        .write_stdin("/frobnicate\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Unknown command '/frobnicate'"));
}
