//! Draggable part widget
//!
//! Pointer interaction for one on-board part, as an explicit state machine:
//!
//! ```text
//!            down                move (unlocked)
//!   Idle ───────────▶ Pressed ─────────────────▶ Dragging
//!    ▲                  │  up                       │ up / leave
//!    │                  ▼                           │
//!    │ window     AwaitingSecondClick ◀─────────────┘ (to Idle)
//!    └─ elapsed ───────┘   │ down + up within window
//!       (single click)     ▼
//!                       lock toggled ─▶ Idle
//! ```
//!
//! Time comes from a [`Clock`] so click disambiguation is testable without
//! real timers. The host calls [`PartWidget::poll`] periodically (or before
//! the next event) to flush a pending single click. A second press that
//! turns into a drag flushes the first click immediately.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::board::{Bounds, Part, Point};

/// Second activation must arrive within this window to count as a double.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(250);

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Events the widget emits towards the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// New clamped top-left position during a drag.
    Moved { id: String, position: Point },
    /// Double activation.
    LockToggled { id: String },
    /// Single activation, only when the click callback is enabled.
    Clicked { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetState {
    Idle,
    Pressed {
        origin: Point,
        offset: Point,
        /// Set when this press may complete a double activation.
        first_click_at: Option<Instant>,
    },
    Dragging {
        offset: Point,
    },
    AwaitingSecondClick {
        since: Instant,
    },
}

/// Interaction state for one part.
#[derive(Debug, Clone)]
pub struct PartWidget<C: Clock = SystemClock> {
    id: String,
    boundary: Bounds,
    click_enabled: bool,
    window: Duration,
    state: WidgetState,
    clock: C,
}

impl<C: Clock> PartWidget<C> {
    pub fn new(id: impl Into<String>, boundary: Bounds, clock: C) -> Self {
        Self {
            id: id.into(),
            boundary,
            click_enabled: false,
            window: DOUBLE_CLICK_WINDOW,
            state: WidgetState::Idle,
            clock,
        }
    }

    /// Widget bounded to the board for `part`'s footprint.
    pub fn for_part(part: &Part, clock: C) -> Self {
        Self::new(part.id.clone(), Bounds::for_part(part), clock)
    }

    /// Enable the single-click callback.
    pub fn with_click(mut self, enabled: bool) -> Self {
        self.click_enabled = enabled;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn boundary(&self) -> Bounds {
        self.boundary
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, WidgetState::Dragging { .. })
    }

    /// Flush a pending single click whose window has elapsed.
    pub fn poll(&mut self) -> Vec<WidgetEvent> {
        let mut events = Vec::new();
        self.expire(self.clock.now(), &mut events);
        events
    }

    pub fn pointer_down(&mut self, part: &Part, at: Point) -> Vec<WidgetEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();
        self.expire(now, &mut events);

        let first_click_at = match self.state {
            WidgetState::AwaitingSecondClick { since } => Some(since),
            _ => None,
        };
        self.state = WidgetState::Pressed {
            origin: at,
            offset: Point::new(at.x - part.x, at.y - part.y),
            first_click_at,
        };
        events
    }

    pub fn pointer_move(&mut self, part: &Part, at: Point) -> Vec<WidgetEvent> {
        let mut events = Vec::new();
        if part.locked {
            return events;
        }
        let offset = match self.state {
            WidgetState::Pressed { origin, .. } if origin == at => return events,
            WidgetState::Pressed {
                offset, first_click_at, ..
            } => {
                // the earlier release still counts as a single click
                if first_click_at.is_some() && self.click_enabled {
                    events.push(WidgetEvent::Clicked {
                        id: self.id.clone(),
                    });
                }
                offset
            }
            WidgetState::Dragging { offset } => offset,
            _ => return events,
        };
        self.state = WidgetState::Dragging { offset };
        let position = self.boundary.clamp(at.x - offset.x, at.y - offset.y);
        events.push(WidgetEvent::Moved {
            id: self.id.clone(),
            position,
        });
        events
    }

    pub fn pointer_up(&mut self, _part: &Part, _at: Point) -> Vec<WidgetEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();
        match self.state {
            WidgetState::Dragging { .. } => self.state = WidgetState::Idle,
            WidgetState::Pressed { first_click_at, .. } => match first_click_at {
                Some(since) if now.duration_since(since) <= self.window => {
                    self.state = WidgetState::Idle;
                    events.push(WidgetEvent::LockToggled {
                        id: self.id.clone(),
                    });
                }
                _ => self.state = WidgetState::AwaitingSecondClick { since: now },
            },
            WidgetState::Idle | WidgetState::AwaitingSecondClick { .. } => {}
        }
        events
    }

    /// Pointer left the element. Ends a drag exactly like pointer-up.
    pub fn pointer_leave(&mut self) -> Vec<WidgetEvent> {
        match self.state {
            WidgetState::Dragging { .. } => self.state = WidgetState::Idle,
            WidgetState::Pressed { first_click_at, .. } => {
                self.state = match first_click_at {
                    Some(since) => WidgetState::AwaitingSecondClick { since },
                    None => WidgetState::Idle,
                };
            }
            _ => {}
        }
        Vec::new()
    }

    /// Native double activation (e.g. a platform double-click or keyboard
    /// shortcut). Overrides any drag and suppresses the pending click.
    pub fn double_activate(&mut self) -> Vec<WidgetEvent> {
        self.state = WidgetState::Idle;
        vec![WidgetEvent::LockToggled {
            id: self.id.clone(),
        }]
    }

    fn expire(&mut self, now: Instant, events: &mut Vec<WidgetEvent>) {
        if let WidgetState::AwaitingSecondClick { since } = self.state {
            if now.duration_since(since) > self.window {
                self.state = WidgetState::Idle;
                if self.click_enabled {
                    events.push(WidgetEvent::Clicked {
                        id: self.id.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PartCategory;

    fn part() -> Part {
        Part::new("p1", "MCU", PartCategory::Controller, Point::new(100.0, 100.0), (60.0, 60.0))
    }

    fn widget(clock: &ManualClock) -> PartWidget<ManualClock> {
        PartWidget::for_part(&part(), clock.clone()).with_click(true)
    }

    fn apply(part: &mut Part, events: &[WidgetEvent]) {
        for e in events {
            match e {
                WidgetEvent::Moved { position, .. } => {
                    part.set_position(position.x, position.y);
                }
                WidgetEvent::LockToggled { .. } => part.locked = !part.locked,
                WidgetEvent::Clicked { .. } => {}
            }
        }
    }

    #[test]
    fn test_drag_moves_with_offset() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let mut p = part();

        let down = w.pointer_down(&p, Point::new(110.0, 110.0));
        apply(&mut p, &down);
        let events = w.pointer_move(&p, Point::new(150.0, 130.0));
        apply(&mut p, &events);
        assert!(w.is_dragging());
        assert_eq!(p.position(), Point::new(140.0, 120.0));

        assert!(w.pointer_up(&p, Point::new(150.0, 130.0)).is_empty());
        assert_eq!(w.state(), WidgetState::Idle);
    }

    #[test]
    fn test_drag_clamped_on_every_move() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let mut p = part();

        w.pointer_down(&p, Point::new(100.0, 100.0));
        for target in [
            Point::new(-5000.0, 40.0),
            Point::new(9000.0, 9000.0),
            Point::new(f64::NAN, -1.0),
        ] {
            let events = w.pointer_move(&p, target);
            apply(&mut p, &events);
            let b = w.boundary();
            assert!(p.x >= b.left && p.x <= b.right);
            assert!(p.y >= b.top && p.y <= b.bottom);
        }
        assert_eq!(p.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_locked_part_ignores_drag() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let mut p = part();
        p.locked = true;

        w.pointer_down(&p, Point::new(110.0, 110.0));
        assert!(w.pointer_move(&p, Point::new(300.0, 300.0)).is_empty());
        w.pointer_up(&p, Point::new(300.0, 300.0));
        assert_eq!(p.position(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_leave_ends_drag() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let p = part();

        w.pointer_down(&p, Point::new(110.0, 110.0));
        w.pointer_move(&p, Point::new(120.0, 120.0));
        w.pointer_leave();
        assert_eq!(w.state(), WidgetState::Idle);
        assert!(w.pointer_move(&p, Point::new(200.0, 200.0)).is_empty());
    }

    #[test]
    fn test_double_click_toggles_lock_without_click() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let mut p = part();
        let at = Point::new(110.0, 110.0);
        let mut events = Vec::new();

        events.extend(w.pointer_down(&p, at));
        events.extend(w.pointer_up(&p, at));
        clock.advance(Duration::from_millis(120));
        events.extend(w.pointer_down(&p, at));
        events.extend(w.pointer_up(&p, at));
        clock.advance(Duration::from_millis(500));
        events.extend(w.poll());

        apply(&mut p, &events);
        assert_eq!(
            events,
            vec![WidgetEvent::LockToggled { id: "p1".into() }]
        );
        assert!(p.locked);
    }

    #[test]
    fn test_single_click_fires_after_window() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let p = part();
        let at = Point::new(110.0, 110.0);

        w.pointer_down(&p, at);
        w.pointer_up(&p, at);
        clock.advance(Duration::from_millis(100));
        assert!(w.poll().is_empty());
        clock.advance(Duration::from_millis(200));
        assert_eq!(w.poll(), vec![WidgetEvent::Clicked { id: "p1".into() }]);
        assert!(w.poll().is_empty());
    }

    #[test]
    fn test_click_disabled_never_fires() {
        let clock = ManualClock::new();
        let mut w = PartWidget::for_part(&part(), clock.clone());
        let p = part();
        let at = Point::new(110.0, 110.0);

        w.pointer_down(&p, at);
        w.pointer_up(&p, at);
        clock.advance(Duration::from_secs(1));
        assert!(w.poll().is_empty());
        assert_eq!(w.state(), WidgetState::Idle);
    }

    #[test]
    fn test_slow_second_click_is_two_singles() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let p = part();
        let at = Point::new(110.0, 110.0);

        w.pointer_down(&p, at);
        w.pointer_up(&p, at);
        clock.advance(Duration::from_millis(400));
        let events = w.pointer_down(&p, at);
        assert_eq!(events, vec![WidgetEvent::Clicked { id: "p1".into() }]);
        assert!(w.pointer_up(&p, at).is_empty());
        clock.advance(Duration::from_millis(400));
        assert_eq!(w.poll(), vec![WidgetEvent::Clicked { id: "p1".into() }]);
    }

    #[test]
    fn test_drag_does_not_count_as_click() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let p = part();

        w.pointer_down(&p, Point::new(110.0, 110.0));
        w.pointer_move(&p, Point::new(130.0, 110.0));
        w.pointer_up(&p, Point::new(130.0, 110.0));
        clock.advance(Duration::from_secs(1));
        assert!(w.poll().is_empty());
    }

    #[test]
    fn test_click_then_quick_drag_keeps_the_click() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let p = part();
        let at = Point::new(110.0, 110.0);

        w.pointer_down(&p, at);
        w.pointer_up(&p, at);
        clock.advance(Duration::from_millis(100));
        w.pointer_down(&p, at);
        let events = w.pointer_move(&p, Point::new(150.0, 110.0));
        assert_eq!(
            events,
            vec![
                WidgetEvent::Clicked { id: "p1".into() },
                WidgetEvent::Moved {
                    id: "p1".into(),
                    position: Point::new(140.0, 100.0)
                },
            ]
        );

        // only once, and the drag itself stays silent
        assert_eq!(w.pointer_move(&p, Point::new(160.0, 110.0)).len(), 1);
        assert!(w.pointer_up(&p, Point::new(160.0, 110.0)).is_empty());
        clock.advance(Duration::from_secs(1));
        assert!(w.poll().is_empty());
    }

    #[test]
    fn test_locked_part_unlocks_by_double_click() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let mut p = part();
        p.locked = true;
        let at = Point::new(110.0, 110.0);

        w.pointer_down(&p, at);
        w.pointer_up(&p, at);
        clock.advance(Duration::from_millis(50));
        w.pointer_down(&p, at);
        let events = w.pointer_up(&p, at);
        apply(&mut p, &events);
        assert!(!p.locked);
        assert_eq!(p.position(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_double_activate_overrides_drag() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let mut p = part();

        w.pointer_down(&p, Point::new(110.0, 110.0));
        let moved = w.pointer_move(&p, Point::new(150.0, 150.0));
        apply(&mut p, &moved);
        let before = p.position();
        apply(&mut p, &w.double_activate());
        assert!(p.locked);
        assert_eq!(w.state(), WidgetState::Idle);
        assert!(w.pointer_move(&p, Point::new(300.0, 300.0)).is_empty());
        assert_eq!(p.position(), before);
    }

    #[test]
    fn test_toggle_twice_restores_lock_and_position() {
        let clock = ManualClock::new();
        let mut w = widget(&clock);
        let mut p = part();
        let before = p.clone();

        apply(&mut p, &w.double_activate());
        apply(&mut p, &w.double_activate());
        assert_eq!(p, before);
    }
}
