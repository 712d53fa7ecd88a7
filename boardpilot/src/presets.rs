//! Built-in board presets
//!
//! Presets are named templates of initial parts, embedded in the binary as
//! JSON. Part names in a template are translation keys; they are resolved
//! against the active language when the preset is instantiated.

use serde::{Deserialize, Serialize};

use crate::board::{Part, PartCategory, Point};
use crate::localization::Localizer;

const EMBEDDED_PRESETS: &str = include_str!("../presets/builtin.json");

/// Id of the part whose single click opens a sensor reading.
pub const SOIL_SENSOR_ID: &str = "ss_sensor";

/// One part inside a preset template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetPart {
    pub id: String,
    pub name_key: String,
    pub category: PartCategory,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub thermal_hotspot: bool,
}

/// Named template of initial parts, loaded as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name_key: String,
    pub description_key: String,
    pub parts: Vec<PresetPart>,
}

impl Preset {
    /// Build a fresh part list from the template.
    ///
    /// Every part comes out unlocked and clamped to the board, with its
    /// name translated (the key itself when no translation exists).
    pub fn instantiate(&self, localizer: &Localizer) -> Vec<Part> {
        self.parts
            .iter()
            .map(|p| {
                let mut part = Part::new(
                    p.id.clone(),
                    localizer.t_or(&p.name_key, &p.name_key),
                    p.category,
                    Point::new(p.x, p.y),
                    (p.width, p.height),
                );
                part.thermal_hotspot = p.thermal_hotspot;
                part
            })
            .collect()
    }

    pub fn display_name(&self, localizer: &Localizer) -> String {
        localizer.t_or(&self.name_key, &self.name_key)
    }

    pub fn description(&self, localizer: &Localizer) -> String {
        localizer.t_or(&self.description_key, "")
    }
}

/// All presets compiled into the binary, in display order.
pub fn builtin_presets() -> Vec<Preset> {
    match serde_json::from_str::<Vec<Preset>>(EMBEDDED_PRESETS) {
        Ok(presets) => presets,
        Err(e) => {
            tracing::warn!("Failed to parse embedded presets: {}", e);
            Vec::new()
        }
    }
}

/// Look up a built-in preset by id.
pub fn find_preset(id: &str) -> Option<Preset> {
    builtin_presets().into_iter().find(|p| p.id == id)
}
