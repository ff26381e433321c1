//! Panes revolving on a ring around the vertical axis.
//!
//! Pane `i` of `n` sits at angle `θ = i/n·360 + rotation` degrees:
//!
//! ```text
//! x = sin θ · r        z = cos θ · r − r
//! ```
//!
//! so the pane at `θ = 0` is nearest the viewer at `z = 0`. Focusing index
//! `k` eases `rotation` along the shorter arc toward `360 − k/n·360`.
//! Dragging maps horizontal pixels straight to degrees; a flick coasts with
//! decaying momentum and always ends by focusing the nearest pane.

use std::any::Any;

use statig::blocking::{IntoStateMachineExt, StateMachine};
use tracing::{debug, info};

use crate::config::{CarouselMotion, MotionConfig};
use crate::drag::DragTracker;
use crate::math::{Size, Vec2, Vec3, clerp, modulo};
use crate::state_machine::motion_sm::{MotionEvent, MotionMachine, State as MotionState};
use crate::widget::{AttachCx, FrameCx, InputCx, Widget, WidgetCore};
use crate::widgets::pane::Pane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselConfig {
    pub centered_x: bool,
    pub centered_y: bool,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            centered_x: true,
            centered_y: true,
        }
    }
}

type IndexChangeHandler = Box<dyn FnMut(usize)>;

pub struct PaneCarousel {
    core: WidgetCore,
    config: CarouselConfig,
    motion: CarouselMotion,
    radius_override: Option<f64>,
    panes: Vec<Pane>,
    rotation: f64,
    current_index: usize,
    offset: Vec3,
    machine: StateMachine<MotionMachine>,
    drag: DragTracker,
    drag_start_rotation: f64,
    momentum: f64,
    on_index_change: Option<IndexChangeHandler>,
}

impl Default for PaneCarousel {
    fn default() -> Self {
        Self::new()
    }
}

impl PaneCarousel {
    pub fn new() -> Self {
        Self::with_config(CarouselConfig::default())
    }

    pub fn with_config(config: CarouselConfig) -> Self {
        Self {
            core: WidgetCore::default(),
            config,
            motion: CarouselMotion::default(),
            radius_override: None,
            panes: Vec::new(),
            rotation: 0.0,
            current_index: 0,
            offset: Vec3::ZERO,
            machine: MotionMachine::new("carousel").state_machine(),
            drag: DragTracker::new(),
            drag_start_rotation: 0.0,
            momentum: 0.0,
            on_index_change: None,
        }
    }

    pub fn add_pane(&mut self, pane: Pane) {
        self.panes.push(pane);
    }

    pub fn with_pane(mut self, pane: Pane) -> Self {
        self.add_pane(pane);
        self
    }

    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    pub fn len(&self) -> usize {
        self.panes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Degrees, not necessarily in `[0, 360)` while easing.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn target_rotation(&self) -> f64 {
        if self.panes.is_empty() {
            return self.rotation;
        }
        360.0 - (self.current_index as f64 / self.panes.len() as f64) * 360.0
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn motion_state(&self) -> &MotionState {
        self.machine.state()
    }

    pub fn is_settled(&self) -> bool {
        self.machine.state().is_idle()
    }

    pub fn radius(&self) -> f64 {
        self.radius_override.unwrap_or(self.motion.radius)
    }

    /// Fix the ring radius regardless of later config reloads.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius_override = Some(radius);
    }

    /// Shift the whole ring, e.g. for parallax.
    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    /// Called with the new index whenever focus lands on a different pane.
    pub fn on_index_change(&mut self, handler: impl FnMut(usize) + 'static) {
        self.on_index_change = Some(Box::new(handler));
    }

    /// Focus pane `index`, wrapping out-of-range values. No-op without
    /// panes.
    pub fn focus_by_index(&mut self, index: isize) {
        let n = self.panes.len();
        if n == 0 {
            return;
        }

        let wrapped = modulo(index as f64, n as f64) as usize;
        let changed = wrapped != self.current_index;
        self.current_index = wrapped;

        for (i, pane) in self.panes.iter_mut().enumerate() {
            pane.set_active(i == wrapped);
        }

        self.momentum = 0.0;
        self.machine.handle(&MotionEvent::Retarget);

        if changed {
            info!(target: "carousel", index = wrapped, "focus changed");
            if let Some(handler) = self.on_index_change.as_mut() {
                handler(wrapped);
            }
        }
    }

    /// Index whose resting angle is closest to the current rotation.
    pub fn nearest_index(&self) -> usize {
        let n = self.panes.len();
        if n == 0 {
            return 0;
        }
        let nearest = (modulo(-self.rotation, 360.0) / 360.0 * n as f64).round() as usize;
        nearest % n
    }

    fn focus_nearest(&mut self) {
        let nearest = self.nearest_index();
        self.focus_by_index(nearest as isize);
    }

    /// Advance the focus animation or the momentum loop by one frame.
    fn step(&mut self, dt: f64) {
        match self.machine.state().clone() {
            MotionState::Animating {} => {
                let target = self.target_rotation();
                if (self.rotation - target).abs() < self.motion.snap_threshold {
                    self.rotation = target;
                    self.machine.handle(&MotionEvent::Settled);
                } else {
                    let step = dt.min(self.motion.max_step);
                    self.rotation = clerp(self.rotation, target, step * self.motion.ease_rate);
                }
            }
            MotionState::Coasting {} => {
                self.rotation = modulo(self.rotation + self.momentum, 360.0);
                self.momentum *= self.motion.decay;
                if self.momentum.abs() < self.motion.rest_threshold {
                    debug!(target: "carousel", rotation = self.rotation, "momentum spent");
                    self.focus_nearest();
                }
            }
            MotionState::Idle {} | MotionState::Dragging {} => {}
        }
    }

    fn layout(&self, cx: &mut FrameCx<'_>) {
        let n = self.panes.len() as f64;
        let radius = self.radius();
        let base = self.core.position() + cx.origin + self.offset;

        for (i, pane) in self.panes.iter().enumerate() {
            let i_f = i as f64;
            let oscillation = (cx.time + i_f * 2.0).sin();
            let theta = modulo(i_f / n * 360.0 + self.rotation, 360.0).to_radians();
            let half = pane.size().half();

            let center_x = if self.config.centered_x { cx.viewport.width / 2.0 - half.x } else { 0.0 };
            let center_y = if self.config.centered_y { cx.viewport.height / 2.0 - half.y } else { 0.0 };

            let translation = base
                + Vec3::new(
                    theta.sin() * radius + center_x,
                    center_y + oscillation * self.motion.bob,
                    theta.cos() * radius - radius,
                );
            let rotation = Vec3::new(0.0, theta + oscillation * 0.05, 0.0);

            cx.emit(i, pane.draw(translation, rotation));
        }
    }
}

impl Widget for PaneCarousel {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    /// Ring diameter by the tallest pane.
    fn measure(&self) -> Size {
        let tallest = self.panes.iter().map(|p| p.size().height).fold(0.0, f64::max);
        Size::new(self.radius() * 2.0, tallest)
    }

    /// The front pane is centred on the viewport, not the ring's corner.
    fn anchor(&self, viewport: Size) -> Vec3 {
        let mut anchor = self.core.position() + self.offset;
        let half = self.measure().half();
        if self.config.centered_x {
            anchor.x += viewport.width / 2.0 - half.x;
        }
        if self.config.centered_y {
            anchor.y += viewport.height / 2.0 - half.y;
        }
        anchor
    }

    fn attach(&mut self, cx: &mut AttachCx<'_>) {
        self.motion = cx.config.carousel.clone();
        cx.listen_document();
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        self.step(cx.dt);
        self.layout(cx);
    }

    fn pointer_down(&mut self, part: usize, pointer: Vec2, _cx: &mut InputCx<'_>) -> bool {
        if part >= self.panes.len() {
            return false;
        }
        self.momentum = 0.0;
        self.drag.begin(pointer);
        self.drag_start_rotation = self.rotation;
        self.machine.handle(&MotionEvent::Grab);
        true
    }

    fn pointer_move(&mut self, pointer: Vec2, _cx: &mut InputCx<'_>) {
        if let Some(motion) = self.drag.move_to(pointer) {
            self.rotation = modulo(self.drag_start_rotation + motion.total.x * self.motion.sensitivity, 360.0);
        }
    }

    fn pointer_up(&mut self, pointer: Vec2, _cx: &mut InputCx<'_>) {
        let Some(last) = self.drag.end() else { return };

        if last.x != 0.0 {
            self.momentum = last.x * self.motion.momentum_scale;
            self.machine.handle(&MotionEvent::Release { coast: true });
        } else {
            self.machine.handle(&MotionEvent::Release { coast: false });
            if !self.drag.is_tap(pointer, self.motion.tap_threshold) {
                self.focus_nearest();
            }
        }
    }

    fn click(&mut self, part: usize, pointer: Vec2, _cx: &mut InputCx<'_>) {
        if part < self.panes.len() && self.drag.is_tap(pointer, self.motion.tap_threshold) {
            self.focus_by_index(part as isize);
        }
    }

    fn reconfigure(&mut self, config: &MotionConfig) {
        self.motion = config.carousel.clone();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{RenderNode, WidgetId};
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f64 = 1.0 / 60.0;

    fn carousel(n: usize) -> PaneCarousel {
        let mut c = PaneCarousel::new();
        for _ in 0..n {
            c.add_pane(Pane::sized(300.0, 400.0));
        }
        c
    }

    fn tick(c: &mut PaneCarousel) -> Vec<RenderNode> {
        let mut nodes = Vec::new();
        let mut cx = FrameCx::new(WidgetId(0), DT, 0.0, Vec3::ZERO, Size::new(1200.0, 800.0), &mut nodes);
        c.tick(&mut cx);
        nodes
    }

    fn settle(c: &mut PaneCarousel) -> usize {
        for frame in 0..10_000 {
            tick(c);
            if c.is_settled() {
                return frame;
            }
        }
        panic!("carousel never settled");
    }

    fn input<R>(f: impl FnOnce(&mut InputCx<'_>) -> R) -> R {
        let mut target = Vec3::ZERO;
        let mut cx = InputCx::new(Vec3::ZERO, Size::new(1200.0, 800.0), 0.0, &mut target);
        f(&mut cx)
    }

    #[test]
    fn focus_targets_resting_angle() {
        let mut c = carousel(8);
        c.focus_by_index(3);
        assert_eq!(c.current_index(), 3);
        assert!((c.target_rotation() - 225.0).abs() < 1e-9);
        assert!(c.panes()[3].is_active());
        assert_eq!(c.panes().iter().filter(|p| p.is_active()).count(), 1);

        settle(&mut c);
        assert_eq!(c.rotation(), c.target_rotation());
    }

    #[test]
    fn focused_pane_is_nearest_viewer() {
        let mut c = carousel(8);
        c.focus_by_index(3);
        settle(&mut c);

        let nodes = tick(&mut c);
        let nearest = nodes
            .iter()
            .max_by(|a, b| a.translation.z.total_cmp(&b.translation.z))
            .unwrap();
        assert_eq!(nearest.key.part, 3);
        assert!(nearest.translation.z.abs() < 1e-9);
        // Centred horizontally: viewport/2 - pane/2.
        assert!((nearest.translation.x - 450.0).abs() < 1e-6);
    }

    #[test]
    fn same_index_notifies_once() {
        let mut c = carousel(5);
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        c.on_index_change(move |i| log.borrow_mut().push(i));

        c.focus_by_index(2);
        c.focus_by_index(2);
        c.focus_by_index(7);
        assert_eq!(*calls.borrow(), vec![2]);
    }

    #[test]
    fn indices_wrap() {
        let mut a = carousel(6);
        a.focus_by_index(2);
        settle(&mut a);
        a.focus_by_index(6);
        settle(&mut a);

        let mut b = carousel(6);
        b.focus_by_index(2);
        settle(&mut b);
        b.focus_by_index(0);
        settle(&mut b);
        assert_eq!(a.current_index(), 0);
        assert_eq!(a.rotation(), b.rotation());

        a.focus_by_index(-1);
        settle(&mut a);
        b.focus_by_index(5);
        settle(&mut b);
        assert_eq!(a.current_index(), 5);
        assert_eq!(a.rotation(), b.rotation());
    }

    #[test]
    fn easing_takes_the_short_way_round() {
        let mut c = carousel(8);
        c.focus_by_index(1);
        settle(&mut c);
        assert_eq!(c.rotation(), 315.0);

        // 315 -> 360 is 45 degrees forward, never back through 180.
        c.focus_by_index(0);
        for _ in 0..20 {
            tick(&mut c);
            assert!(c.rotation() >= 315.0 && c.rotation() <= 360.0);
        }
    }

    #[test]
    fn empty_carousel_ignores_focus() {
        let mut c = PaneCarousel::new();
        c.focus_by_index(4);
        assert_eq!(c.current_index(), 0);
        assert!(c.is_settled());
        assert!(tick(&mut c).is_empty());
        assert_eq!(c.nearest_index(), 0);
    }

    #[test]
    fn drag_maps_pixels_to_degrees() {
        let mut c = carousel(4);
        assert!(input(|cx| c.pointer_down(0, Vec2::new(100.0, 0.0), cx)));
        assert!(c.motion_state().is_dragging());
        input(|cx| c.pointer_move(Vec2::new(300.0, 0.0), cx));
        assert!((c.rotation() - 10.0).abs() < 1e-9);
        input(|cx| c.pointer_move(Vec2::new(0.0, 0.0), cx));
        assert!((c.rotation() - 355.0).abs() < 1e-9);
    }

    #[test]
    fn momentum_decays_within_bound_and_focuses_nearest() {
        let mut c = carousel(8);
        let calls = Rc::new(RefCell::new(0));
        let count = calls.clone();
        c.on_index_change(move |_| *count.borrow_mut() += 1);

        input(|cx| c.pointer_down(0, Vec2::new(0.0, 0.0), cx));
        input(|cx| c.pointer_move(Vec2::new(20.0, 0.0), cx));
        input(|cx| c.pointer_up(Vec2::new(20.0, 0.0), cx));
        assert!(matches!(c.motion_state(), MotionState::Coasting {}));
        assert!((c.momentum() - 2.0).abs() < 1e-9);

        // ceil(ln(0.025 / 2) / ln(0.975)) = 174 frames.
        for _ in 0..173 {
            tick(&mut c);
        }
        assert!(matches!(c.motion_state(), MotionState::Coasting {}));
        tick(&mut c);
        assert!(!matches!(c.motion_state(), MotionState::Coasting {}));
        assert_eq!(c.momentum(), 0.0);

        settle(&mut c);
        assert_eq!(c.rotation(), c.target_rotation());
        assert_eq!(c.current_index(), c.nearest_index());
        assert!(*calls.borrow() <= 1);
    }

    #[test]
    fn new_drag_preempts_coasting() {
        let mut c = carousel(8);
        input(|cx| c.pointer_down(0, Vec2::new(0.0, 0.0), cx));
        input(|cx| c.pointer_move(Vec2::new(50.0, 0.0), cx));
        input(|cx| c.pointer_up(Vec2::new(50.0, 0.0), cx));
        tick(&mut c);

        input(|cx| c.pointer_down(1, Vec2::new(0.0, 0.0), cx));
        let held = c.rotation();
        for _ in 0..10 {
            tick(&mut c);
        }
        assert_eq!(c.rotation(), held);
        assert_eq!(c.momentum(), 0.0);
    }

    #[test]
    fn click_honoured_only_for_taps() {
        let mut c = carousel(8);

        input(|cx| c.pointer_down(5, Vec2::new(10.0, 10.0), cx));
        input(|cx| c.pointer_up(Vec2::new(12.0, 11.0), cx));
        input(|cx| c.click(5, Vec2::new(12.0, 11.0), cx));
        assert_eq!(c.current_index(), 5);

        input(|cx| c.pointer_down(2, Vec2::new(10.0, 10.0), cx));
        input(|cx| c.pointer_move(Vec2::new(40.0, 10.0), cx));
        input(|cx| c.pointer_move(Vec2::new(10.0, 10.0), cx));
        input(|cx| c.pointer_up(Vec2::new(10.0, 10.0), cx));
        input(|cx| c.click(2, Vec2::new(10.0, 10.0), cx));
        assert_ne!(c.current_index(), 2);
    }

    #[test]
    fn reconfigure_keeps_explicit_radius() {
        let mut c = carousel(3);
        c.set_radius(250.0);
        let mut config = MotionConfig::default();
        config.carousel.radius = 900.0;
        config.carousel.decay = 0.5;
        c.reconfigure(&config);
        assert_eq!(c.radius(), 250.0);
        assert_eq!(c.motion.decay, 0.5);
    }
}
