//! Headless run of the showcase with a scripted input sequence. Each frame
//! is printed to stdout as one JSON object, so motion can be diffed or
//! plotted without a window.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use panes::widgets::PaneCarousel;
use panes::{MotionConfig, Pointer, RenderNode, Size, Stage, Vec2, Vec3};

use crate::showcase;

const VIEWPORT: Size = Size::new(1280.0, 800.0);

/// One scripted input, applied at the start of its frame.
#[derive(Debug, Clone, Copy)]
enum Input {
    Focus(isize),
    Wheel(Vec2),
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
}

/// Focus a pane, scroll down to the carousel, flick it, then drag the page
/// back up past its top edge.
fn script() -> Vec<(usize, Input)> {
    let mut steps = vec![
        (5, Input::Focus(3)),
        (60, Input::Wheel(Vec2::new(0.0, 250.0))),
        (64, Input::Wheel(Vec2::new(0.0, 250.0))),
    ];

    let centre = VIEWPORT.half();
    steps.push((150, Input::Down(centre)));
    for i in 1..=6 {
        steps.push((150 + i, Input::Move(centre + Vec2::new(i as f64 * 30.0, 0.0))));
    }
    steps.push((157, Input::Up(centre + Vec2::new(180.0, 0.0))));

    // Empty space below the carousel's left flank.
    let margin = Vec2::new(60.0, 720.0);
    steps.push((400, Input::Down(margin)));
    for i in 1..=10 {
        steps.push((400 + i, Input::Move(margin + Vec2::new(0.0, i as f64 * 80.0))));
    }
    steps.push((411, Input::Up(margin + Vec2::new(0.0, 800.0))));
    steps
}

#[derive(Serialize)]
struct Snapshot<'a> {
    frame: usize,
    time: f64,
    origin: Vec3,
    target_origin: Vec3,
    dragging: bool,
    carousel: Option<CarouselSnapshot>,
    nodes: &'a [RenderNode],
}

#[derive(Serialize)]
struct CarouselSnapshot {
    rotation: f64,
    index: usize,
    state: String,
}

fn apply(stage: &mut Stage, input: Input) {
    let time = stage.time();
    let at = |p: Vec2| Pointer::new(p.x, p.y, time);
    match input {
        Input::Focus(index) => {
            if let Some(carousel) = stage.find_as_mut::<PaneCarousel>(showcase::CAROUSEL) {
                carousel.focus_by_index(index);
            }
        }
        Input::Wheel(delta) => stage.wheel(delta, at(VIEWPORT.half())),
        Input::Down(p) => stage.pointer_down(at(p)),
        Input::Move(p) => stage.pointer_move(at(p)),
        Input::Up(p) => {
            stage.pointer_up(at(p));
            stage.click(at(p));
        }
    }
}

pub fn run(frames: usize, fps: f64, config: MotionConfig) -> Result<()> {
    let dt = if fps > 0.0 { 1.0 / fps } else { 1.0 / 60.0 };
    let mut stage = showcase::build(VIEWPORT, config);
    let script = script();
    let mut nodes: Vec<RenderNode> = Vec::new();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for frame in 0..frames {
        for (_, input) in script.iter().filter(|(at, _)| *at == frame) {
            debug!(frame, ?input, "scripted input");
            apply(&mut stage, *input);
        }

        nodes.clear();
        stage.update(dt, &mut nodes);

        let carousel = stage.find_as::<PaneCarousel>(showcase::CAROUSEL).map(|c| CarouselSnapshot {
            rotation: c.rotation(),
            index: c.current_index(),
            state: format!("{:?}", c.motion_state()),
        });
        let snapshot = Snapshot {
            frame,
            time: stage.time(),
            origin: stage.origin(),
            target_origin: stage.target_origin(),
            dragging: stage.is_dragging(),
            carousel,
            nodes: &nodes,
        };
        serde_json::to_writer(&mut out, &snapshot)?;
        writeln!(out)?;
    }
    Ok(())
}
