//! Pointer interaction through the board view into the controller

use std::time::Duration;

use boardpilot::prelude::*;
use boardpilot::widget::DOUBLE_CLICK_WINDOW;
use boardpilot::{ManualClock, SOIL_SENSOR_ID};
use proptest::prelude::*;

const PAST_WINDOW: Duration = Duration::from_millis(300);

fn soil_board() -> BoardController {
    let mut controller = BoardController::new(Localizer::embedded(), AiGateway::unconfigured()).with_seed(11);
    controller.load_preset("soil_sensor").unwrap();
    controller
}

fn relay(controller: &mut BoardController, events: Vec<ViewEvent>) -> Vec<ViewEvent> {
    for event in &events {
        controller.apply_view_event(event.clone());
    }
    events
}

fn center(controller: &BoardController, id: &str) -> Point {
    controller.part(id).unwrap().center()
}

fn click(view: &mut BoardView<ManualClock>, controller: &mut BoardController, at: Point) -> Vec<ViewEvent> {
    let mut events = view.pointer_down(controller.parts(), at);
    events.extend(view.pointer_up(controller.parts(), at));
    relay(controller, events)
}

fn in_bounds(part: &Part) -> bool {
    part.x >= 0.0
        && part.y >= 0.0
        && part.x <= boardpilot::BOARD_WIDTH - part.width
        && part.y <= boardpilot::BOARD_HEIGHT - part.height
}

#[derive(Debug, Clone)]
enum Gesture {
    Down(usize),
    Move(f64, f64),
    Up,
    Leave,
    Wait,
}

fn gesture() -> impl Strategy<Value = Gesture> {
    prop_oneof![
        (0usize..3).prop_map(Gesture::Down),
        (-2000.0f64..2000.0, -2000.0f64..2000.0).prop_map(|(x, y)| Gesture::Move(x, y)),
        Just(Gesture::Up),
        Just(Gesture::Leave),
        Just(Gesture::Wait),
    ]
}

/// Replays gestures. The clock always moves past the double-click window
/// after a release so no gesture doubles up into a lock toggle.
fn replay(gestures: &[Gesture], controller: &mut BoardController, clock: &ManualClock, view: &mut BoardView<ManualClock>) {
    for g in gestures {
        let events = match g {
            Gesture::Down(i) => {
                let at = controller.parts()[i % controller.parts().len()].center();
                view.pointer_down(controller.parts(), at)
            }
            Gesture::Move(x, y) => view.pointer_move(controller.parts(), Point::new(*x, *y)),
            Gesture::Up => {
                let events = view.pointer_up(controller.parts(), Point::new(0.0, 0.0));
                clock.advance(PAST_WINDOW);
                events
            }
            Gesture::Leave => view.pointer_leave(),
            Gesture::Wait => {
                clock.advance(PAST_WINDOW);
                view.poll()
            }
        };
        relay(controller, events);
    }
}

proptest! {
    #[test]
    fn drag_sequences_stay_on_board(gestures in prop::collection::vec(gesture(), 1..40)) {
        let mut controller = soil_board();
        let clock = ManualClock::new();
        let mut view = BoardView::with_clock(clock.clone());

        replay(&gestures, &mut controller, &clock, &mut view);

        for part in controller.parts() {
            prop_assert!(in_bounds(part), "{} left the board at ({}, {})", part.id, part.x, part.y);
        }
    }

    #[test]
    fn locked_part_never_moves(gestures in prop::collection::vec(gesture(), 1..40)) {
        let mut controller = soil_board();
        controller.toggle_lock("ss_mcu").unwrap();
        let before = controller.part("ss_mcu").unwrap().position();
        let clock = ManualClock::new();
        let mut view = BoardView::with_clock(clock.clone());

        replay(&gestures, &mut controller, &clock, &mut view);

        let mcu = controller.part("ss_mcu").unwrap();
        prop_assert!(mcu.locked);
        prop_assert_eq!(mcu.position(), before);
    }
}

#[test]
fn test_drag_follows_pointer_offset() {
    let mut controller = soil_board();
    let mut view = BoardView::with_clock(ManualClock::new());

    // grab the MCU 5 units in from its corner
    let grab = Point::new(35.0, 35.0);
    let mut events = view.pointer_down(controller.parts(), grab);
    events.extend(view.pointer_move(controller.parts(), Point::new(105.0, 205.0)));
    assert!(view.is_dragging());
    events.extend(view.pointer_up(controller.parts(), Point::new(105.0, 205.0)));
    relay(&mut controller, events);

    assert!(!view.is_dragging());
    assert_eq!(controller.part("ss_mcu").unwrap().position(), Point::new(100.0, 200.0));
}

#[test]
fn test_drag_clamps_to_right_edge() {
    let mut controller = soil_board();
    let mut view = BoardView::with_clock(ManualClock::new());

    let at = center(&controller, "ss_power");
    let mut events = view.pointer_down(controller.parts(), at);
    events.extend(view.pointer_move(controller.parts(), Point::new(9000.0, -50.0)));
    events.extend(view.pointer_leave());
    relay(&mut controller, events);

    let power = controller.part("ss_power").unwrap();
    assert_eq!(power.position(), Point::new(boardpilot::BOARD_WIDTH - 30.0, 0.0));

    // leave ended the drag
    let events = view.pointer_move(controller.parts(), Point::new(10.0, 10.0));
    assert!(events.is_empty());
}

#[test]
fn test_double_click_toggles_lock_once_without_sensor_click() {
    let mut controller = soil_board();
    let clock = ManualClock::new();
    let mut view = BoardView::with_clock(clock.clone());
    let at = center(&controller, SOIL_SENSOR_ID);

    let mut events = click(&mut view, &mut controller, at);
    clock.advance(Duration::from_millis(100));
    events.extend(click(&mut view, &mut controller, at));
    clock.advance(PAST_WINDOW);
    events.extend(relay(&mut controller, view.poll()));

    assert_eq!(
        events,
        vec![ViewEvent::LockToggled {
            id: SOIL_SENSOR_ID.to_string()
        }]
    );
    assert!(controller.part(SOIL_SENSOR_ID).unwrap().locked);
    assert!(controller.transcript().is_empty());
}

#[test]
fn test_single_click_on_sensor_takes_reading() {
    let mut controller = soil_board();
    let clock = ManualClock::new();
    let mut view = BoardView::with_clock(clock.clone());
    let at = center(&controller, SOIL_SENSOR_ID);

    let events = click(&mut view, &mut controller, at);
    assert!(events.is_empty());
    assert!(view.poll().is_empty());

    clock.advance(DOUBLE_CLICK_WINDOW + Duration::from_millis(1));
    let events = view.poll();
    assert_eq!(
        events,
        vec![ViewEvent::SensorClicked {
            id: SOIL_SENSOR_ID.to_string()
        }]
    );

    let reading = controller.apply_view_event(events[0].clone()).unwrap();
    assert!(reading.moisture <= 100);
    assert_eq!(reading.part_name, "Moisture Probe");
    let log = &controller.transcript().entries()[0];
    assert_eq!(log.sender, Sender::System);
    assert!(log.text.contains("Moisture Probe"));
}

#[test]
fn test_slow_second_click_counts_as_two_singles() {
    let mut controller = soil_board();
    let clock = ManualClock::new();
    let mut view = BoardView::with_clock(clock.clone());
    let at = center(&controller, SOIL_SENSOR_ID);

    click(&mut view, &mut controller, at);
    clock.advance(PAST_WINDOW);
    let mut events = click(&mut view, &mut controller, at);
    clock.advance(PAST_WINDOW);
    events.extend(view.poll());

    let clicks = events
        .iter()
        .filter(|e| matches!(e, ViewEvent::SensorClicked { .. }))
        .count();
    assert_eq!(clicks, 2);
    assert!(!controller.part(SOIL_SENSOR_ID).unwrap().locked);
}

#[test]
fn test_rapid_third_click_starts_a_new_window() {
    let mut controller = soil_board();
    let clock = ManualClock::new();
    let mut view = BoardView::with_clock(clock.clone());
    let at = center(&controller, SOIL_SENSOR_ID);

    let mut events = click(&mut view, &mut controller, at);
    events.extend(click(&mut view, &mut controller, at));
    events.extend(click(&mut view, &mut controller, at));
    clock.advance(PAST_WINDOW);
    events.extend(view.poll());

    assert_eq!(
        events,
        vec![
            ViewEvent::LockToggled {
                id: SOIL_SENSOR_ID.to_string()
            },
            ViewEvent::SensorClicked {
                id: SOIL_SENSOR_ID.to_string()
            },
        ]
    );
}

#[test]
fn test_click_on_non_sensor_part_is_silent() {
    let mut controller = soil_board();
    let clock = ManualClock::new();
    let mut view = BoardView::with_clock(clock.clone());
    let at = center(&controller, "ss_mcu");

    click(&mut view, &mut controller, at);
    clock.advance(PAST_WINDOW);
    assert!(view.poll().is_empty());
}

#[test]
fn test_locked_part_unlocks_by_double_click_and_keeps_position() {
    let mut controller = soil_board();
    let clock = ManualClock::new();
    let mut view = BoardView::with_clock(clock.clone());
    let at = center(&controller, "ss_mcu");
    let before = controller.part("ss_mcu").unwrap().position();

    let events = view.double_activate(controller.parts(), at);
    relay(&mut controller, events);
    assert!(controller.part("ss_mcu").unwrap().locked);

    let mut events = view.pointer_down(controller.parts(), at);
    events.extend(view.pointer_move(controller.parts(), Point::new(400.0, 300.0)));
    events.extend(view.pointer_up(controller.parts(), Point::new(400.0, 300.0)));
    relay(&mut controller, events);
    assert_eq!(controller.part("ss_mcu").unwrap().position(), before);
    clock.advance(PAST_WINDOW);
    assert!(view.poll().is_empty());

    click(&mut view, &mut controller, at);
    click(&mut view, &mut controller, at);
    let mcu = controller.part("ss_mcu").unwrap();
    assert!(!mcu.locked);
    assert_eq!(mcu.position(), before);
}

#[test]
fn test_pointer_down_on_empty_board_does_nothing() {
    let controller = soil_board();
    let mut view = BoardView::with_clock(ManualClock::new());
    assert!(view.pointer_down(controller.parts(), Point::new(480.0, 340.0)).is_empty());
    assert!(view.pointer_move(controller.parts(), Point::new(10.0, 10.0)).is_empty());
}

#[test]
fn test_view_drops_widgets_for_removed_parts() {
    let mut controller = soil_board();
    let mut view = BoardView::with_clock(ManualClock::new());
    let at = center(&controller, "ss_mcu");
    view.pointer_down(controller.parts(), at);

    controller.load_preset("irrigation_timer").unwrap();
    view.sync(controller.parts());
    assert!(view.pointer_move(controller.parts(), Point::new(300.0, 300.0)).is_empty());
}

#[test]
fn test_hotspot_overlays_follow_parts() {
    let mut controller = soil_board();
    controller.load_preset("irrigation_timer").unwrap();

    let overlays = boardpilot::view::hotspot_overlays(controller.parts());
    let ids: Vec<&str> = overlays.iter().map(|o| o.part_id.as_str()).collect();
    assert_eq!(ids, vec!["it_mcu", "it_power"]);
    assert_eq!(overlays[0].center, Point::new(80.0, 80.0));
    assert_eq!(overlays[0].diameter, 50.0);
}
