//! Board data model
//!
//! Parts, their categories and the fixed board geometry. Every site that
//! sets a part position goes through [`Bounds::clamp`] so the placement
//! invariant `0 <= x <= BOARD_WIDTH - width` (and likewise for `y`) holds
//! everywhere, not only at creation.

use serde::{Deserialize, Serialize};

/// Board width in abstract board units.
pub const BOARD_WIDTH: f64 = 500.0;

/// Board height in abstract board units.
pub const BOARD_HEIGHT: f64 = 350.0;

/// Diameter of the soft highlight drawn over a thermal hotspot.
pub const HOTSPOT_DIAMETER: f64 = 50.0;

/// Category of a placeable part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    Controller,
    Sensor,
    PowerRegulator,
    Resistor,
    Capacitor,
    Connector,
    Other,
}

impl PartCategory {
    pub const ALL: [PartCategory; 7] = [
        PartCategory::Controller,
        PartCategory::Sensor,
        PartCategory::PowerRegulator,
        PartCategory::Resistor,
        PartCategory::Capacitor,
        PartCategory::Connector,
        PartCategory::Other,
    ];

    /// Stable machine name, also used to build translation keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartCategory::Controller => "controller",
            PartCategory::Sensor => "sensor",
            PartCategory::PowerRegulator => "power_regulator",
            PartCategory::Resistor => "resistor",
            PartCategory::Capacitor => "capacitor",
            PartCategory::Connector => "connector",
            PartCategory::Other => "other",
        }
    }

    /// English label used in prompts and as a last-resort display name.
    pub fn label(&self) -> &'static str {
        match self {
            PartCategory::Controller => "Microcontroller",
            PartCategory::Sensor => "Sensor",
            PartCategory::PowerRegulator => "Power IC",
            PartCategory::Resistor => "Resistor",
            PartCategory::Capacitor => "Capacitor",
            PartCategory::Connector => "Connector",
            PartCategory::Other => "Other",
        }
    }

    /// Translation key for the category's display name.
    pub fn translation_key(&self) -> String {
        format!("componentType.{}", self.as_str())
    }

    /// Footprint given to manually added parts of this category.
    pub fn default_size(&self) -> (f64, f64) {
        match self {
            PartCategory::Controller => (60.0, 60.0),
            PartCategory::PowerRegulator => (50.0, 40.0),
            _ => (40.0, 30.0),
        }
    }

    /// Categories that dissipate enough power to be hotspot candidates.
    pub fn is_heat_source(&self) -> bool {
        matches!(self, PartCategory::Controller | PartCategory::PowerRegulator)
    }

    /// Parse a category from its machine name or English label.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|c| {
            c.as_str() == needle || c.label().to_lowercase().replace(' ', "_") == needle
        })
    }
}

impl std::fmt::Display for PartCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A point in board-local units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Inclusive rectangle of allowed top-left positions for one part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    /// Allowed top-left positions for a `width` x `height` part on the board.
    ///
    /// A part larger than the board is pinned at the origin.
    pub fn for_size(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: (BOARD_WIDTH - width).max(0.0),
            bottom: (BOARD_HEIGHT - height).max(0.0),
        }
    }

    pub fn for_part(part: &Part) -> Self {
        Self::for_size(part.width, part.height)
    }

    /// Clamp a position into the rectangle.
    ///
    /// Non-finite coordinates collapse to the nearest edge so a garbage
    /// pointer or model reply can never leave a part off the board.
    pub fn clamp(&self, x: f64, y: f64) -> Point {
        Point {
            x: clamp_axis(x, self.left, self.right),
            y: clamp_axis(y, self.top, self.bottom),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

fn clamp_axis(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        return lo;
    }
    v.max(lo).min(hi)
}

/// One placeable component on the simulated board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub category: PartCategory,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub thermal_hotspot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl Part {
    /// Create an unlocked part at a clamped position.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: PartCategory,
        position: Point,
        size: (f64, f64),
    ) -> Self {
        let mut part = Self {
            id: id.into(),
            name: name.into(),
            category,
            x: 0.0,
            y: 0.0,
            width: size.0,
            height: size.1,
            locked: false,
            thermal_hotspot: false,
            rotation: None,
        };
        part.set_position(position.x, position.y);
        part
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::for_part(self)
    }

    /// Move the part, clamped to the board. Returns the applied position.
    pub fn set_position(&mut self, x: f64, y: f64) -> Point {
        let p = self.bounds().clamp(x, y);
        self.x = p.x;
        self.y = p.y;
        p
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether a board-local point falls on the part's footprint.
    pub fn hit(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// One-line description used inside AI prompts.
    pub fn prompt_line(&self) -> String {
        format!(
            "ID: {}, Name: {}, Type: {}, X: {}, Y: {}, Width: {}, Height: {}, Locked: {}",
            self.id,
            self.name,
            self.category.label(),
            self.x.round(),
            self.y.round(),
            self.width,
            self.height,
            if self.locked { "Yes" } else { "No" }
        )
    }
}

/// Apply one AI-suggested position to the matching part.
///
/// Returns `false` when the id is unknown or the part is locked; those
/// entries are skipped without touching anything else.
pub fn apply_suggested_position(parts: &mut [Part], id: &str, x: f64, y: f64) -> bool {
    match parts.iter_mut().find(|p| p.id == id) {
        Some(part) if !part.locked => {
            part.set_position(x, y);
            true
        }
        _ => false,
    }
}
