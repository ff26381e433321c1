//! The demonstration page: an intro title over drifting particles, then a
//! carousel, a slider, a row of small cards and a pan-and-zoom field, all
//! stacked down one scrollable stage.

use std::sync::mpsc;

use panes::animation::{Completion, Flow, TweenConfig, ease_in_out};
use panes::widget::Theme;
use panes::widgets::{PaneCarousel, PaneField, Pane, Particles, Row, Scrollbar, PaneSlider, Text3D};
use panes::{Color, MotionConfig, Size, Stage, StageOptions, Transform, Vec3, Widget, WidgetExt};
use tracing::info;

pub const CAROUSEL: &str = "carousel";
pub const CAROUSEL_TITLE: &str = "carousel-title";
pub const SLIDER: &str = "slider";
pub const FIELD: &str = "field";
pub const PARTICLES: &str = "particles";

/// Total scroll depth of the page.
pub const PAGE_DEPTH: f64 = 3000.0;

const CAROUSEL_LABELS: [&str; 8] = [
    "Harbour", "Orchard", "Quarry", "Lantern", "Meadow", "Foundry", "Glasshouse", "Observatory",
];

const PARALLAX: f64 = 0.3;
const FADE_SECONDS: f64 = 0.25;

pub fn build(viewport: Size, config: MotionConfig) -> Stage {
    let options = StageOptions {
        scrollable_x: false,
        scrollable_y: true,
        draggable_x: false,
        draggable_y: true,
    };
    let mut stage = Stage::with_config(options, config);
    stage.set_viewport(viewport);

    stage.add(Particles::new(60).with_color(Color::rgb(255, 196, 140)).named(PARTICLES));

    stage.add_at(
        Text3D::new("panes").centered().with_font_size(72.0),
        Vec3::new(0.0, -260.0, 0.0),
    );
    stage.add_at(
        Text3D::new("scroll, drag, or swipe").centered().with_font_size(20.0),
        Vec3::new(0.0, -180.0, 0.0),
    );

    add_carousel(&mut stage);
    add_slider(&mut stage);
    add_cards(&mut stage);
    add_field(&mut stage);

    stage.add(Scrollbar::new(PAGE_DEPTH));

    parallax(&mut stage);
    info!(target: "stage", widgets = stage.len(), "showcase built");
    stage
}

fn add_carousel(stage: &mut Stage) {
    let (tx, rx) = mpsc::channel();

    let mut carousel = PaneCarousel::new();
    for (i, label) in CAROUSEL_LABELS.iter().enumerate() {
        let theme = if i % 3 == 0 { Theme::Accent } else { Theme::Light };
        carousel.add_pane(Pane::sized(320.0, 420.0).themed(theme).labeled(*label));
    }
    carousel.on_index_change(move |index| {
        let _ = tx.send(index);
    });

    stage.add_at(carousel.named(CAROUSEL), Vec3::new(0.0, 1000.0, 0.0));
    stage.add_at(
        Text3D::new(CAROUSEL_LABELS[0]).centered().with_font_size(36.0).named(CAROUSEL_TITLE),
        Vec3::new(0.0, 1300.0, 0.0),
    );

    cross_fade_title(stage, rx);
}

/// Fades the carousel title out, swaps in the newly focused label, and fades
/// it back in. Index changes that arrive mid-fade collapse into the latest.
fn cross_fade_title(stage: &mut Stage, rx: mpsc::Receiver<usize>) {
    enum Fade {
        Idle,
        Out(Completion),
        In(Completion),
    }

    let mut fade = Fade::Idle;
    let mut latest: Option<usize> = None;

    stage.animate(move |stage: &mut Stage, _dt| {
        if let Some(index) = rx.try_iter().last() {
            latest = Some(index);
        }

        fade = match std::mem::replace(&mut fade, Fade::Idle) {
            Fade::Idle if latest.is_some() => Fade::Out(tween_title(stage, 1.0, 0.0)),
            Fade::Out(done) if done.is_resolved() => {
                if let Some(label) = latest.take().and_then(|i| CAROUSEL_LABELS.get(i)) {
                    if let Some(title) = stage.find_as_mut::<Text3D>(CAROUSEL_TITLE) {
                        title.set_text(*label);
                    }
                }
                Fade::In(tween_title(stage, 0.0, 1.0))
            }
            Fade::In(done) if done.is_resolved() => Fade::Idle,
            pending => pending,
        };
        Flow::Continue
    });
}

fn tween_title(stage: &mut Stage, from: f64, to: f64) -> Completion {
    let config = TweenConfig::new(from, to, FADE_SECONDS).with_easing(ease_in_out);
    let (_, done) = stage.tween(config, |stage, opacity| {
        if let Some(title) = stage.find_as_mut::<Text3D>(CAROUSEL_TITLE) {
            title.set_opacity(opacity);
        }
    });
    done
}

fn add_slider(stage: &mut Stage) {
    let widths = [360.0, 240.0, 420.0, 300.0, 360.0];
    let mut slider = PaneSlider::new();
    for (i, width) in widths.iter().enumerate() {
        let theme = if i % 2 == 0 { Theme::Dark } else { Theme::Light };
        slider.add_pane(Pane::sized(*width, 260.0).themed(theme).labeled(format!("Slide {}", i + 1)));
    }
    stage.add_at(slider.named(SLIDER), Vec3::new(0.0, 1800.0, 0.0));
}

fn add_cards(stage: &mut Stage) {
    let cards: Vec<Box<dyn Widget>> = (0..3)
        .map(|i| Box::new(Pane::sized(220.0, 140.0).labeled(format!("Card {}", i + 1))) as Box<dyn Widget>)
        .collect();

    let heading: Box<dyn Widget> =
        Box::new(Text3D::new("Cards").with_font_size(28.0).transformed(Transform::new().y(20.0)));
    let row: Box<dyn Widget> = Box::new(Row::new(cards));

    stage.add_group(Vec3::new(120.0, 2200.0, 0.0), vec![heading, row]);
}

fn add_field(stage: &mut Stage) {
    let spots = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(420.0, 80.0, -150.0),
        Vec3::new(180.0, 320.0, -60.0),
        Vec3::new(640.0, 360.0, 0.0),
        Vec3::new(880.0, 40.0, -240.0),
    ];
    let mut field = PaneField::new();
    for (i, spot) in spots.iter().enumerate() {
        let theme = if i == 0 { Theme::Accent } else { Theme::Dark };
        field.add_pane(Pane::sized(200.0, 140.0).themed(theme), *spot);
    }
    stage.add_at(field.named(FIELD), Vec3::new(160.0, 2700.0, 0.0));
}

/// Particles drift against the page at a fraction of the scroll speed.
fn parallax(stage: &mut Stage) {
    stage.animate(|stage: &mut Stage, _dt| {
        let origin = stage.origin();
        if let Some(particles) = stage.find_as_mut::<Particles>(PARTICLES) {
            particles.transform(Transform::at(origin.x * PARALLAX, origin.y * PARALLAX, 0.0));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use panes::widget::NullSink;

    fn frames(stage: &mut Stage, n: usize) {
        for _ in 0..n {
            stage.update(1.0 / 60.0, &mut NullSink);
        }
    }

    #[test]
    fn builds_named_residents() {
        let stage = build(Size::new(1280.0, 800.0), MotionConfig::default());
        for name in [CAROUSEL, CAROUSEL_TITLE, SLIDER, FIELD, PARTICLES] {
            assert!(stage.find(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn title_follows_carousel_focus() {
        let mut stage = build(Size::new(1280.0, 800.0), MotionConfig::default());
        frames(&mut stage, 1);
        stage.find_as_mut::<PaneCarousel>(CAROUSEL).unwrap().focus_by_index(2);
        frames(&mut stage, 240);

        let title = stage.find_as::<Text3D>(CAROUSEL_TITLE).unwrap();
        assert_eq!(title.text(), CAROUSEL_LABELS[2]);
        assert_eq!(title.opacity(), 1.0);
    }
}
