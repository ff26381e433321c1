//! Viewport-pinned scroll bar mirroring the stage's vertical range.

use std::any::Any;

use tracing::debug;

use crate::drag::DragTracker;
use crate::math::{Axis, Range, Size, Vec2, Vec3, clamp};
use crate::widget::{AttachCx, Draw, FrameCx, InputCx, NodeKind, Widget, WidgetCore};

const EDGE_MARGIN: f64 = 10.0;
const BAR_SIZE: Size = Size::new(20.0, 300.0);
/// Distance of the bar's left edge from the viewport's right edge.
const BAR_INSET: f64 = 40.0;
const BAR_DEPTH: f64 = 10.0;

pub struct Scrollbar {
    core: WidgetCore,
    range: f64,
    bar_y: f64,
    viewport: Size,
    drag: DragTracker,
    drag_start_y: f64,
}

impl Scrollbar {
    /// `range` is how far the content scrolls down, in pixels.
    pub fn new(range: f64) -> Self {
        Self {
            core: WidgetCore::default(),
            range: range.max(0.0),
            bar_y: EDGE_MARGIN,
            viewport: Size::ZERO,
            drag: DragTracker::new(),
            drag_start_y: EDGE_MARGIN,
        }
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    /// Current top of the bar in viewport pixels.
    pub fn bar_y(&self) -> f64 {
        self.bar_y
    }

    fn travel(viewport: Size) -> f64 {
        (viewport.height - BAR_SIZE.height - EDGE_MARGIN).max(0.0)
    }

    fn position_for(&self, origin_y: f64, viewport: Size) -> f64 {
        if self.range <= 0.0 {
            return EDGE_MARGIN;
        }
        Self::travel(viewport) * (-origin_y / self.range) + EDGE_MARGIN
    }
}

impl Widget for Scrollbar {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn measure(&self) -> Size {
        Size::ZERO
    }

    fn attach(&mut self, cx: &mut AttachCx<'_>) {
        cx.set_range(Axis::Y, Range::new(-self.range, 0.0));
        cx.listen_document();
        self.viewport = cx.viewport;
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        self.viewport = cx.viewport;
        self.bar_y = self.position_for(cx.origin.y, cx.viewport);

        let translation = Vec3::new(cx.viewport.width - BAR_INSET, self.bar_y, BAR_DEPTH);
        cx.emit(0, Draw::new(NodeKind::Bar, translation, BAR_SIZE));
    }

    fn pointer_down(&mut self, _part: usize, pointer: Vec2, _cx: &mut InputCx<'_>) -> bool {
        self.drag.begin(pointer);
        self.drag_start_y = self.bar_y;
        true
    }

    fn pointer_move(&mut self, pointer: Vec2, cx: &mut InputCx<'_>) {
        let Some(motion) = self.drag.move_to(pointer) else { return };

        let span = Self::travel(self.viewport);
        if span <= 0.0 {
            return;
        }
        let ratio = clamp((self.drag_start_y + motion.total.y - EDGE_MARGIN) / span, 0.0, 1.0);

        let mut target = cx.target_origin();
        target.y = -self.range * ratio;
        cx.set_target_origin(target);
    }

    fn pointer_up(&mut self, _pointer: Vec2, _cx: &mut InputCx<'_>) {
        if self.drag.end().is_some() {
            debug!(target: "stage", bar_y = self.bar_y, "scrollbar released");
        }
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
    use crate::stage::{Pointer, Stage, StageOptions};
    use crate::widget::NullSink;

    fn stage_with_bar(range: f64) -> (Stage, crate::widget::WidgetId) {
        let mut stage = Stage::new(StageOptions::default());
        stage.set_viewport(Size::new(1000.0, 710.0));
        let id = stage.add(Scrollbar::new(range));
        (stage, id)
    }

    #[test]
    fn attach_sets_vertical_range() {
        let (stage, _) = stage_with_bar(4000.0);
        assert_eq!(stage.range(Axis::Y), Range::new(-4000.0, 0.0));
    }

    #[test]
    fn bar_tracks_origin() {
        let (mut stage, id) = stage_with_bar(4000.0);
        stage.update(0.016, &mut NullSink);
        assert_eq!(stage.get::<Scrollbar>(id).unwrap().bar_y(), EDGE_MARGIN);

        stage.set_target_origin(Vec3::new(0.0, -2000.0, 0.0));
        for _ in 0..400 {
            stage.update(0.016, &mut NullSink);
        }
        // Half way down: (710 - 300 - 10) * 0.5 + 10.
        let y = stage.get::<Scrollbar>(id).unwrap().bar_y();
        assert!((y - 210.0).abs() < 0.01);
    }

    #[test]
    fn zero_range_pins_bar_to_top() {
        let (mut stage, id) = stage_with_bar(0.0);
        stage.set_target_origin(Vec3::new(0.0, -500.0, 0.0));
        stage.update(0.016, &mut NullSink);
        assert_eq!(stage.get::<Scrollbar>(id).unwrap().bar_y(), EDGE_MARGIN);
    }

    #[test]
    fn dragging_bar_scrolls_stage() {
        let (mut stage, _) = stage_with_bar(4000.0);
        stage.update(0.016, &mut NullSink);

        let bar_x = 1000.0 - BAR_INSET + 5.0;
        stage.pointer_down(Pointer::new(bar_x, 50.0, 0.0));
        assert!(!stage.is_dragging());
        stage.pointer_move(Pointer::new(bar_x, 250.0, 0.1));
        assert!((stage.target_origin().y + 2000.0).abs() < 1e-9);

        // Dragging past the end stays at the end of the range.
        stage.pointer_move(Pointer::new(bar_x, 2000.0, 0.2));
        assert!((stage.target_origin().y + 4000.0).abs() < 1e-9);
        stage.pointer_up(Pointer::new(bar_x, 2000.0, 0.3));
    }
}
