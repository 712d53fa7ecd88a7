use crate::board::{Part, BOARD_HEIGHT, BOARD_WIDTH};

pub const ASSISTANT_NAME: &str = "BoardPilot";

/// Base system instruction sent with every completion.
pub fn system_instruction(language_name: &str) -> String {
    format!(
        r#"You are {name}, an expert AI assistant for PCB (Printed Circuit Board) layout optimization. Your goal is to help users design efficient and reliable PCBs for agricultural electronic devices. Provide concise, actionable advice and data. For layout suggestions, provide coordinates as JSON. PCB dimensions are {w}x{h} units. Ensure all suggested coordinates (x, y) for components are within these boundaries: x between 0 and ({w} - componentWidth), y between 0 and ({h} - componentHeight). Please provide your response in {lang}. If you are providing JSON data, advice text inside the JSON should be in {lang}; IDs and standard technical terms can remain in English."#,
        name = ASSISTANT_NAME,
        w = BOARD_WIDTH,
        h = BOARD_HEIGHT,
        lang = language_name
    )
}

/// All parts, one `prompt_line` each, joined with `"; "`.
pub fn describe_parts(parts: &[Part]) -> String {
    parts.iter().map(Part::prompt_line).collect::<Vec<_>>().join("; ")
}

pub fn build_auto_place_prompt(parts: &[Part], language_name: &str) -> String {
    format!(
        r#"Given these components: [{parts}] on a {w}x{h} PCB, suggest an optimal layout. Locked components must not be moved. Prioritize logical groupings.

Return ONLY a JSON array in this exact format (no markdown, no code blocks):
[{{"id": "componentId", "x": newX, "y": newY}}]

Ensure x is between 0 and (PCBWidth - componentWidth) and y is between 0 and (PCBHeight - componentHeight). Respond in {lang}."#,
        parts = describe_parts(parts),
        w = BOARD_WIDTH,
        h = BOARD_HEIGHT,
        lang = language_name
    )
}

pub fn build_thermal_prompt(parts: &[Part], language_name: &str) -> String {
    format!(
        r#"Analyze this PCB layout for thermal management: [{parts}]. Identify up to 3 components that are thermal hotspots. Provide concise textual advice.

Return ONLY a JSON object in this exact format:
{{"hotspots": ["id1", "id2"], "advice": "Your advice..."}}

Respond in {lang}."#,
        parts = describe_parts(parts),
        lang = language_name
    )
}

pub fn build_signal_integrity_prompt(parts: &[Part], language_name: &str) -> String {
    format!(
        "Analyze [{}] for signal integrity issues (EMI, crosstalk, impedance). Provide concise advice on 2-3 potential problems and improvements. Respond in {}.",
        describe_parts(parts),
        language_name
    )
}

pub fn build_power_path_prompt(parts: &[Part], language_name: &str) -> String {
    format!(
        "For [{}], advise on power path routing (direct paths, trace widths, noise minimization). 2-3 key points. Respond in {}.",
        describe_parts(parts),
        language_name
    )
}

/// Ask for positions that bring `target` close to `anchor`.
pub fn build_place_near_prompt(parts: &[Part], target: &Part, anchor: &Part, language_name: &str) -> String {
    let others: Vec<&Part> = parts
        .iter()
        .filter(|p| p.id != target.id && p.id != anchor.id)
        .collect();
    let others_text = others.iter().map(|p| p.prompt_line()).collect::<Vec<_>>().join("; ");

    format!(
        r#"On a {w}x{h} PCB, component X ({x}) needs to be placed near component Y ({y}). Other components: [{others}]. Suggest new (x, y) positions for non-locked components.

Return ONLY a JSON array in this exact format:
[{{"id": "componentIdToMove", "x": newX, "y": newY}}]

Respond in {lang}."#,
        w = BOARD_WIDTH,
        h = BOARD_HEIGHT,
        x = target.prompt_line(),
        y = anchor.prompt_line(),
        others = if others_text.is_empty() { "none".to_string() } else { others_text },
        lang = language_name
    )
}

pub fn build_advisory_prompt(query: &str, org_name: &str, language_name: &str) -> String {
    format!(
        r#"As {name}, an AI assistant specialized in PCB design for {org}, respond to the user query: "{query}" in {lang}. Keep your response concise and helpful for PCB design context. If the query is unrelated to PCB design or electronics, politely state your specialization in {lang}."#,
        name = ASSISTANT_NAME,
        org = org_name,
        query = query,
        lang = language_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PartCategory, Point};

    fn parts() -> Vec<Part> {
        let mut locked = Part::new("b", "LDO", PartCategory::PowerRegulator, Point::new(10.4, 20.6), (50.0, 40.0));
        locked.locked = true;
        vec![
            Part::new("a", "TinyMCU", PartCategory::Controller, Point::new(30.0, 30.0), (60.0, 60.0)),
            locked,
            Part::new("c", "Probe", PartCategory::Sensor, Point::new(200.0, 100.0), (40.0, 30.0)),
        ]
    }

    #[test]
    fn test_system_instruction_mentions_bounds_and_language() {
        let s = system_instruction("German");
        assert!(s.contains("500x350"));
        assert!(s.contains("in German"));
    }

    #[test]
    fn test_describe_parts() {
        let text = describe_parts(&parts());
        assert!(text.contains("ID: a, Name: TinyMCU, Type: Microcontroller, X: 30, Y: 30"));
        assert!(text.contains("X: 10, Y: 21, Width: 50, Height: 40, Locked: Yes"));
        assert_eq!(text.matches("; ").count(), 2);
    }

    #[test]
    fn test_place_near_lists_others_only() {
        let parts = parts();
        let prompt = build_place_near_prompt(&parts, &parts[0], &parts[2], "English");
        assert!(prompt.contains("component X (ID: a,"));
        assert!(prompt.contains("component Y (ID: c,"));
        assert!(prompt.contains("Other components: [ID: b,"));
    }

    #[test]
    fn test_advisory_prompt_quotes_query() {
        let prompt = build_advisory_prompt("what is a via?", "BoardPilot", "Spanish");
        assert!(prompt.contains("\"what is a via?\""));
        assert!(prompt.contains("in Spanish"));
    }

    #[test]
    fn test_structured_prompts_request_json() {
        let parts = parts();
        assert!(build_auto_place_prompt(&parts, "English").contains("JSON array"));
        assert!(build_thermal_prompt(&parts, "English").contains("\"hotspots\""));
    }
}
