//! Board view
//!
//! Composes one [`PartWidget`] per part, routes board-level pointer events
//! to the topmost part under the pointer and relays the resulting events.
//! Only the designated sensor part gets a single-click callback; its click
//! surfaces as [`ViewEvent::SensorClicked`].
//!
//! The view owns interaction state only. Parts are always passed in by the
//! caller, which keeps them authoritative.

use std::collections::HashMap;

use serde::Serialize;

use crate::board::{Bounds, Part, PartCategory, Point, BOARD_HEIGHT, BOARD_WIDTH, HOTSPOT_DIAMETER};
use crate::presets::SOIL_SENSOR_ID;
use crate::widget::{Clock, PartWidget, SystemClock, WidgetEvent};

/// Events relayed from the board to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Moved { id: String, position: Point },
    LockToggled { id: String },
    SensorClicked { id: String },
}

impl From<WidgetEvent> for ViewEvent {
    fn from(e: WidgetEvent) -> Self {
        match e {
            WidgetEvent::Moved { id, position } => ViewEvent::Moved { id, position },
            WidgetEvent::LockToggled { id } => ViewEvent::LockToggled { id },
            WidgetEvent::Clicked { id } => ViewEvent::SensorClicked { id },
        }
    }
}

/// Soft circular highlight drawn over a hotspot part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotOverlay {
    pub part_id: String,
    pub center: Point,
    pub diameter: f64,
}

/// Overlays for every part flagged as a thermal hotspot.
pub fn hotspot_overlays(parts: &[Part]) -> Vec<HotspotOverlay> {
    parts
        .iter()
        .filter(|p| p.thermal_hotspot)
        .map(|p| HotspotOverlay {
            part_id: p.id.clone(),
            center: p.center(),
            diameter: HOTSPOT_DIAMETER,
        })
        .collect()
}

pub struct BoardView<C: Clock + Clone = SystemClock> {
    clock: C,
    sensor_id: String,
    widgets: HashMap<String, PartWidget<C>>,
    /// Part receiving pointer events between down and up.
    captured: Option<String>,
}

impl BoardView<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for BoardView<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + Clone> BoardView<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            sensor_id: SOIL_SENSOR_ID.to_string(),
            widgets: HashMap::new(),
            captured: None,
        }
    }

    /// Change which part id receives the single-click callback.
    pub fn with_sensor_id(mut self, id: impl Into<String>) -> Self {
        self.sensor_id = id.into();
        self.widgets.clear();
        self
    }

    /// Reconcile widgets with the current part list.
    pub fn sync(&mut self, parts: &[Part]) {
        self.widgets.retain(|id, _| parts.iter().any(|p| &p.id == id));
        for part in parts {
            let boundary = Bounds::for_part(part);
            let stale = self
                .widgets
                .get(&part.id)
                .map(|w| w.boundary() != boundary)
                .unwrap_or(true);
            if stale {
                let widget = PartWidget::for_part(part, self.clock.clone())
                    .with_click(part.id == self.sensor_id);
                self.widgets.insert(part.id.clone(), widget);
            }
        }
        if let Some(id) = &self.captured {
            if !self.widgets.contains_key(id) {
                self.captured = None;
            }
        }
    }

    /// Topmost part under a board-local point. Later parts draw on top.
    pub fn hit_test<'a>(&self, parts: &'a [Part], at: Point) -> Option<&'a Part> {
        parts.iter().rev().find(|p| p.hit(at))
    }

    pub fn pointer_down(&mut self, parts: &[Part], at: Point) -> Vec<ViewEvent> {
        self.sync(parts);
        let Some(part) = self.hit_test(parts, at) else {
            return Vec::new();
        };
        self.captured = Some(part.id.clone());
        self.forward(&part.id, |w| w.pointer_down(part, at))
    }

    pub fn pointer_move(&mut self, parts: &[Part], at: Point) -> Vec<ViewEvent> {
        let Some(part) = self.captured_part(parts) else {
            return Vec::new();
        };
        self.forward(&part.id, |w| w.pointer_move(part, at))
    }

    pub fn pointer_up(&mut self, parts: &[Part], at: Point) -> Vec<ViewEvent> {
        let Some(part) = self.captured_part(parts) else {
            return Vec::new();
        };
        self.captured = None;
        self.forward(&part.id, |w| w.pointer_up(part, at))
    }

    /// Pointer left the board; any drag in progress ends.
    pub fn pointer_leave(&mut self) -> Vec<ViewEvent> {
        let Some(id) = self.captured.take() else {
            return Vec::new();
        };
        self.forward(&id, |w| w.pointer_leave())
    }

    pub fn double_activate(&mut self, parts: &[Part], at: Point) -> Vec<ViewEvent> {
        self.sync(parts);
        let Some(part) = self.hit_test(parts, at) else {
            return Vec::new();
        };
        self.captured = None;
        self.forward(&part.id, |w| w.double_activate())
    }

    /// Flush pending single clicks on every widget.
    pub fn poll(&mut self) -> Vec<ViewEvent> {
        self.widgets
            .values_mut()
            .flat_map(|w| w.poll())
            .map(ViewEvent::from)
            .collect()
    }

    pub fn is_dragging(&self) -> bool {
        self.widgets.values().any(|w| w.is_dragging())
    }

    fn captured_part<'a>(&self, parts: &'a [Part]) -> Option<&'a Part> {
        let id = self.captured.as_deref()?;
        parts.iter().find(|p| p.id == id)
    }

    fn forward(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut PartWidget<C>) -> Vec<WidgetEvent>,
    ) -> Vec<ViewEvent> {
        match self.widgets.get_mut(id) {
            Some(widget) => f(widget).into_iter().map(ViewEvent::from).collect(),
            None => Vec::new(),
        }
    }
}

fn glyph(part: &Part) -> char {
    if part.locked {
        return '#';
    }
    if part.thermal_hotspot {
        return '*';
    }
    match part.category {
        PartCategory::Controller => 'M',
        PartCategory::Sensor => 'S',
        PartCategory::PowerRegulator => 'P',
        PartCategory::Resistor => 'R',
        PartCategory::Capacitor => 'C',
        PartCategory::Connector => 'J',
        PartCategory::Other => 'O',
    }
}

/// Character-grid rendering of the board followed by a part legend.
pub fn render_text(parts: &[Part], cols: usize, rows: usize) -> String {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let cell_w = BOARD_WIDTH / cols as f64;
    let cell_h = BOARD_HEIGHT / rows as f64;

    let mut out = String::new();
    let border = format!("+{}+\n", "-".repeat(cols));
    out.push_str(&border);
    for r in 0..rows {
        out.push('|');
        for c in 0..cols {
            let at = Point::new((c as f64 + 0.5) * cell_w, (r as f64 + 0.5) * cell_h);
            let ch = parts.iter().rev().find(|p| p.hit(at)).map(glyph).unwrap_or(' ');
            out.push(ch);
        }
        out.push_str("|\n");
    }
    out.push_str(&border);

    for part in parts {
        let mut flags = Vec::new();
        if part.locked {
            flags.push("locked");
        }
        if part.thermal_hotspot {
            flags.push("hotspot");
        }
        out.push_str(&format!(
            "  {} {:<16} {:<18} ({:>5.1}, {:>5.1}) {}x{}{}\n",
            glyph(part),
            part.id,
            part.name,
            part.x,
            part.y,
            part.width,
            part.height,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        ));
    }
    out
}
