//! Horizontal group: children sit side by side from the row's position.

use std::any::Any;

use crate::config::MotionConfig;
use crate::math::{Size, Vec2, Vec3};
use crate::widget::{AttachCx, FrameCx, InputCx, Widget, WidgetCore};

/// Parts reserved per child in the row's node key space.
pub const CHILD_PARTS: usize = 1000;

pub struct Row {
    core: WidgetCore,
    children: Vec<Box<dyn Widget>>,
}

impl Row {
    pub fn new(children: Vec<Box<dyn Widget>>) -> Self {
        Self {
            core: WidgetCore::default(),
            children,
        }
    }

    pub fn children(&self) -> &[Box<dyn Widget>] {
        &self.children
    }

    /// Base position of child `index` as of the last layout.
    pub fn child_position(&self, index: usize) -> Option<Vec3> {
        self.children.get(index).map(|c| c.core().base_position)
    }

    /// Re-seat every child at the row's position, advancing X by each
    /// child's measured width.
    fn layout(&mut self) {
        let mut running = self.core.position();
        for child in &mut self.children {
            child.core_mut().base_position = running;
            running.x += child.measure().width;
        }
    }

    fn child_for(&mut self, part: usize) -> Option<(&mut Box<dyn Widget>, usize)> {
        let index = part / CHILD_PARTS;
        self.children.get_mut(index).map(|c| (c, part % CHILD_PARTS))
    }
}

impl Widget for Row {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn measure(&self) -> Size {
        self.children.iter().fold(Size::ZERO, |acc, child| {
            let s = child.measure();
            Size::new(acc.width + s.width, acc.height.max(s.height))
        })
    }

    fn attach(&mut self, cx: &mut AttachCx<'_>) {
        self.layout();
        for child in &mut self.children {
            child.attach(cx);
        }
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        self.layout();
        for (i, child) in self.children.iter_mut().enumerate() {
            child.tick(&mut cx.nested(i * CHILD_PARTS));
        }
    }

    fn pointer_down(&mut self, part: usize, pointer: Vec2, cx: &mut InputCx<'_>) -> bool {
        match self.child_for(part) {
            Some((child, part)) => child.pointer_down(part, pointer, cx),
            None => false,
        }
    }

    fn pointer_move(&mut self, pointer: Vec2, cx: &mut InputCx<'_>) {
        for child in &mut self.children {
            child.pointer_move(pointer, cx);
        }
    }

    fn pointer_up(&mut self, pointer: Vec2, cx: &mut InputCx<'_>) {
        for child in &mut self.children {
            child.pointer_up(pointer, cx);
        }
    }

    fn click(&mut self, part: usize, pointer: Vec2, cx: &mut InputCx<'_>) {
        if let Some((child, part)) = self.child_for(part) {
            child.click(part, pointer, cx);
        }
    }

    fn wheel(&mut self, delta: Vec2, pointer: Vec2, cx: &mut InputCx<'_>) -> bool {
        self.children.iter_mut().any(|child| child.wheel(delta, pointer, cx))
    }

    fn reconfigure(&mut self, config: &MotionConfig) {
        for child in &mut self.children {
            child.reconfigure(config);
        }
    }

    fn detach(&mut self) {
        for child in &mut self.children {
            child.detach();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
