//! A block of text floating in the scene.

use std::any::Any;

use crate::math::{Size, Vec2, Vec3, clamp};
use crate::widget::{Draw, FrameCx, NodeKind, Widget, WidgetCore};

pub const DEFAULT_FONT_SIZE: f64 = 32.0;

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.55;
const LINE_HEIGHT: f64 = 1.25;

#[derive(Debug, Clone)]
pub struct Text3D {
    core: WidgetCore,
    text: String,
    font_size: f64,
    opacity: f64,
    centered: bool,
}

impl Text3D {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            core: WidgetCore::default(),
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            opacity: 1.0,
            centered: false,
        }
    }

    /// Position relative to the viewport centre instead of the top-left.
    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size.max(0.0);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = clamp(opacity, 0.0, 1.0);
    }
}

impl Widget for Text3D {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    /// Estimated from the longest line and the line count.
    fn measure(&self) -> Size {
        if self.text.is_empty() {
            return Size::ZERO;
        }
        let longest = self.text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let lines = self.text.lines().count().max(1);
        Size::new(
            longest as f64 * self.font_size * GLYPH_WIDTH,
            lines as f64 * self.font_size * LINE_HEIGHT,
        )
    }

    fn anchor(&self, viewport: Size) -> Vec3 {
        let position = self.core.position();
        if self.centered {
            position + Vec3::with_z(centered_in(viewport, self.measure()), 0.0)
        } else {
            position
        }
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        let size = self.measure();
        let mut translation = self.core.position() + cx.origin;

        if self.centered {
            translation += Vec3::with_z(centered_in(cx.viewport, size), 0.0);
        }

        let draw = Draw::new(
            NodeKind::Text {
                text: self.text.clone(),
                font_size: self.font_size,
            },
            translation,
            size,
        )
        .rotated(self.core.rotation)
        .faded(self.opacity, 0.0);

        cx.emit(0, draw);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Top-left of a block of `size` centred in `viewport`.
pub fn centered_in(viewport: Size, size: Size) -> Vec2 {
    viewport.half() - size.half()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{RenderNode, WidgetId};

    #[test]
    fn measure_follows_longest_line() {
        let text = Text3D::new("ab\nabcd").with_font_size(20.0);
        let size = text.measure();
        assert!((size.width - 4.0 * 20.0 * GLYPH_WIDTH).abs() < 1e-9);
        assert!((size.height - 2.0 * 20.0 * LINE_HEIGHT).abs() < 1e-9);
        assert_eq!(Text3D::new("").measure(), Size::ZERO);
    }

    #[test]
    fn centered_text_sits_mid_viewport() {
        let mut text = Text3D::new("abcd").with_font_size(10.0).centered();
        text.set_opacity(2.0);
        assert_eq!(text.opacity(), 1.0);

        let mut nodes: Vec<RenderNode> = Vec::new();
        let mut cx = FrameCx::new(WidgetId(3), 0.0, 0.0, Vec3::ZERO, Size::new(400.0, 300.0), &mut nodes);
        text.tick(&mut cx);

        let size = text.measure();
        let expected = centered_in(Size::new(400.0, 300.0), size);
        assert!((nodes[0].translation.x - expected.x).abs() < 1e-9);
        assert!((nodes[0].translation.y - expected.y).abs() < 1e-9);
    }
}
