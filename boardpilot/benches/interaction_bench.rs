use criterion::{black_box, criterion_group, criterion_main, Criterion};
use boardpilot::prelude::*;
use boardpilot::view::render_text;
use boardpilot::ManualClock;

fn soil_board() -> BoardController {
    let mut controller = BoardController::new(Localizer::embedded(), AiGateway::unconfigured()).with_seed(1);
    controller
        .load_preset("soil_sensor")
        .expect("builtin preset");
    controller
}

fn bench_drag_sequence(c: &mut Criterion) {
    let mut controller = soil_board();
    let mut view = BoardView::with_clock(ManualClock::new());

    c.bench_function("drag_sequence", |b| {
        b.iter(|| {
            let at = controller.part("ss_power").map(|p| p.center()).unwrap_or_default();
            let mut events = view.pointer_down(controller.parts(), at);
            for step in 0..50 {
                let to = Point::new(at.x + step as f64 * 7.0, at.y - step as f64 * 3.0);
                events.extend(view.pointer_move(controller.parts(), black_box(to)));
            }
            events.extend(view.pointer_up(controller.parts(), at));
            for event in events {
                controller.apply_view_event(event);
            }
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let localizer = Localizer::embedded();
    let commands = [
        "AI auto-place",
        "please optimize for thermal",
        "place LDO near TinyMCU",
        "what is a good trace width for 2A?",
    ];

    c.bench_function("classify_commands", |b| {
        b.iter(|| {
            for command in &commands {
                black_box(boardpilot::classify(black_box(command), &localizer));
            }
        });
    });
}

fn bench_render_text(c: &mut Criterion) {
    let mut controller = soil_board();
    controller.load_preset("drone_monitor").expect("builtin preset");

    c.bench_function("render_text", |b| {
        b.iter(|| render_text(black_box(controller.parts()), 80, 24));
    });
}

criterion_group!(benches, bench_drag_sequence, bench_classify, bench_render_text);
criterion_main!(benches);
