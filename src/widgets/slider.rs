//! Panes in a horizontal strip, dragged and flicked along X.
//!
//! Pane `i` sits at the cumulative width of the panes before it plus one
//! gutter per gap. The strip's `offset` lives in `[-extent, 0]`, where
//! `extent` is that cumulative width without the trailing gutter. The
//! bound is soft: a flick may carry the target past it, after which the
//! target itself is pulled back.

use std::any::Any;

use statig::blocking::{IntoStateMachineExt, StateMachine};
use tracing::info;

use crate::config::{MotionConfig, SliderMotion};
use crate::drag::DragTracker;
use crate::math::{Range, Size, Vec2, Vec3, lerp, modulo};
use crate::state_machine::motion_sm::{MotionEvent, MotionMachine, State as MotionState};
use crate::widget::{AttachCx, FrameCx, InputCx, Widget, WidgetCore};
use crate::widgets::pane::Pane;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderConfig {
    pub centered_x: bool,
    pub centered_y: bool,
    /// Overrides `[slider] gutter` from the motion config.
    pub gutter: Option<f64>,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            centered_x: true,
            centered_y: true,
            gutter: None,
        }
    }
}

pub struct PaneSlider {
    core: WidgetCore,
    config: SliderConfig,
    motion: SliderMotion,
    panes: Vec<Pane>,
    offset: f64,
    target: f64,
    current_index: usize,
    machine: StateMachine<MotionMachine>,
    drag: DragTracker,
    drag_start_offset: f64,
}

impl Default for PaneSlider {
    fn default() -> Self {
        Self::new()
    }
}

impl PaneSlider {
    pub fn new() -> Self {
        Self::with_config(SliderConfig::default())
    }

    pub fn with_config(config: SliderConfig) -> Self {
        Self {
            core: WidgetCore::default(),
            config,
            motion: SliderMotion::default(),
            panes: Vec::new(),
            offset: 0.0,
            target: 0.0,
            current_index: 0,
            machine: MotionMachine::new("slider").state_machine(),
            drag: DragTracker::new(),
            drag_start_offset: 0.0,
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

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn motion_state(&self) -> &MotionState {
        self.machine.state()
    }

    pub fn is_settled(&self) -> bool {
        self.machine.state().is_idle()
    }

    pub fn gutter(&self) -> f64 {
        self.config.gutter.unwrap_or(self.motion.gutter)
    }

    /// Left edge of each pane along the strip.
    pub fn pane_offsets(&self) -> Vec<f64> {
        let gutter = self.gutter();
        let mut running = 0.0;
        self.panes
            .iter()
            .map(|pane| {
                let x = running;
                running += pane.size().width + gutter;
                x
            })
            .collect()
    }

    /// Strip length without the trailing gutter.
    pub fn extent(&self) -> f64 {
        if self.panes.is_empty() {
            return 0.0;
        }
        let widths: f64 = self.panes.iter().map(|p| p.size().width).sum();
        widths + self.gutter() * (self.panes.len() - 1) as f64
    }

    pub fn bounds(&self) -> Range {
        Range::new(-self.extent(), 0.0)
    }

    /// Slide pane `index` (wrapped) to the strip's anchor.
    pub fn focus_by_index(&mut self, index: isize) {
        let n = self.panes.len();
        if n == 0 {
            return;
        }
        let wrapped = modulo(index as f64, n as f64) as usize;
        let x = self.pane_offsets()[wrapped];

        self.target = self.bounds().clamp(-x);
        for (i, pane) in self.panes.iter_mut().enumerate() {
            pane.set_active(i == wrapped);
        }
        if wrapped != self.current_index {
            info!(target: "slider", index = wrapped, "focus changed");
        }
        self.current_index = wrapped;
        self.machine.handle(&MotionEvent::Retarget);
    }

    fn step(&mut self, dt: f64) {
        if matches!(self.machine.state(), MotionState::Idle {} | MotionState::Dragging {}) {
            return;
        }

        let bounds = self.bounds();
        if !bounds.contains(self.target) {
            let bound = bounds.clamp(self.target);
            self.target = lerp(self.target, bound, (dt * self.motion.bound_ease_rate).min(1.0));
            if (self.target - bound).abs() < self.motion.settle_distance {
                self.target = bound;
            }
        }

        self.offset = lerp(self.offset, self.target, (dt * self.motion.ease_rate).min(1.0));

        if (self.offset - self.target).abs() < self.motion.settle_distance && bounds.contains(self.target) {
            self.offset = self.target;
            self.machine.handle(&MotionEvent::Settled);
        }
    }
}

impl Widget for PaneSlider {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn measure(&self) -> Size {
        let tallest = self.panes.iter().map(|p| p.size().height).fold(0.0, f64::max);
        Size::new(self.extent(), tallest)
    }

    fn anchor(&self, viewport: Size) -> Vec3 {
        let mut anchor = self.core.position();
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
        self.motion = cx.config.slider.clone();
        cx.listen_document();
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        self.step(cx.dt);

        let root = self.core.position() + cx.origin;
        for (i, (pane, x)) in self.panes.iter().zip(self.pane_offsets()).enumerate() {
            let half = pane.size().half();
            let center_x = if self.config.centered_x { cx.viewport.width / 2.0 - half.x } else { 0.0 };
            let center_y = if self.config.centered_y { cx.viewport.height / 2.0 - half.y } else { 0.0 };

            let translation = root + Vec3::new(self.offset + x + center_x, center_y, 0.0);
            cx.emit(i, pane.draw(translation, self.core.rotation));
        }
    }

    fn pointer_down(&mut self, part: usize, pointer: Vec2, _cx: &mut InputCx<'_>) -> bool {
        if part >= self.panes.len() {
            return false;
        }
        self.drag.begin(pointer);
        self.drag_start_offset = self.offset;
        self.machine.handle(&MotionEvent::Grab);
        true
    }

    fn pointer_move(&mut self, pointer: Vec2, _cx: &mut InputCx<'_>) {
        if let Some(motion) = self.drag.move_to(pointer) {
            self.offset = self.drag_start_offset + motion.total.x;
            self.target = self.offset;
        }
    }

    fn pointer_up(&mut self, _pointer: Vec2, _cx: &mut InputCx<'_>) {
        let Some(last) = self.drag.end() else { return };
        self.target += last.x * self.motion.momentum;
        self.machine.handle(&MotionEvent::Release { coast: last.x != 0.0 });
    }

    fn click(&mut self, part: usize, pointer: Vec2, _cx: &mut InputCx<'_>) {
        if part < self.panes.len() && self.drag.is_tap(pointer, self.motion.tap_threshold) {
            self.focus_by_index(part as isize);
        }
    }

    fn reconfigure(&mut self, config: &MotionConfig) {
        self.motion = config.slider.clone();
        self.machine.handle(&MotionEvent::Retarget);
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

    const DT: f64 = 1.0 / 60.0;

    fn slider(widths: &[f64]) -> PaneSlider {
        let mut s = PaneSlider::new();
        for w in widths {
            s.add_pane(Pane::sized(*w, 300.0));
        }
        s
    }

    fn tick(s: &mut PaneSlider) -> Vec<RenderNode> {
        let mut nodes = Vec::new();
        let mut cx = FrameCx::new(WidgetId(0), DT, 0.0, Vec3::ZERO, Size::new(1000.0, 800.0), &mut nodes);
        s.tick(&mut cx);
        nodes
    }

    fn input(f: impl FnOnce(&mut InputCx<'_>)) {
        let mut target = Vec3::ZERO;
        let mut cx = InputCx::new(Vec3::ZERO, Size::new(1000.0, 800.0), 0.0, &mut target);
        f(&mut cx);
    }

    #[test]
    fn layout_accumulates_widths_and_gutters() {
        let s = slider(&[100.0, 200.0, 50.0]);
        assert_eq!(s.pane_offsets(), vec![0.0, 130.0, 360.0]);
        assert_eq!(s.extent(), 410.0);
        assert_eq!(s.bounds(), Range::new(-410.0, 0.0));
        assert_eq!(PaneSlider::new().extent(), 0.0);
    }

    #[test]
    fn first_pane_centred_at_rest() {
        let mut s = slider(&[200.0, 200.0]);
        let nodes = tick(&mut s);
        assert_eq!(nodes[0].translation.x, 400.0);
        assert_eq!(nodes[1].translation.x, 630.0);
        assert_eq!(nodes[0].translation.y, 250.0);
    }

    #[test]
    fn drag_tracks_one_to_one() {
        let mut s = slider(&[380.0, 380.0, 380.0]);
        input(|cx| assert!(s.pointer_down(0, Vec2::new(500.0, 0.0), cx)));
        input(|cx| s.pointer_move(Vec2::new(420.0, 0.0), cx));
        assert_eq!(s.offset(), -80.0);
        assert!(s.motion_state().is_dragging());
    }

    #[test]
    fn overscroll_springs_back_to_bound() {
        let mut s = slider(&[380.0, 380.0, 380.0]);
        assert_eq!(s.extent(), 1200.0);

        input(|cx| {
            s.pointer_down(0, Vec2::new(2100.0, 0.0), cx);
        });
        for x in (100..=2100).rev().step_by(100) {
            input(|cx| s.pointer_move(Vec2::new(x as f64, 0.0), cx));
        }
        input(|cx| s.pointer_up(Vec2::new(100.0, 0.0), cx));
        assert!(s.target() < -1200.0);

        for _ in 0..600 {
            tick(&mut s);
            if s.is_settled() {
                break;
            }
        }
        assert!(s.is_settled());
        assert_eq!(s.target(), -1200.0);
        assert_eq!(s.offset(), -1200.0);

        tick(&mut s);
        assert_eq!(s.offset(), -1200.0);
    }

    #[test]
    fn focus_slides_pane_to_anchor() {
        let mut s = slider(&[300.0, 300.0, 300.0, 300.0]);
        s.focus_by_index(2);
        assert_eq!(s.target(), -660.0);
        assert!(s.panes()[2].is_active());

        s.focus_by_index(-1);
        assert_eq!(s.current_index(), 3);
        assert_eq!(s.target(), -990.0);

        for _ in 0..600 {
            tick(&mut s);
        }
        assert_eq!(s.offset(), -990.0);
    }

    #[test]
    fn empty_slider_is_inert() {
        let mut s = PaneSlider::new();
        s.focus_by_index(3);
        assert!(tick(&mut s).is_empty());
        assert_eq!(s.offset(), 0.0);
    }

    #[test]
    fn explicit_gutter_wins() {
        let s = PaneSlider::with_config(SliderConfig {
            gutter: Some(0.0),
            ..SliderConfig::default()
        })
        .with_pane(Pane::sized(100.0, 100.0))
        .with_pane(Pane::sized(100.0, 100.0));
        assert_eq!(s.extent(), 200.0);
    }
}
