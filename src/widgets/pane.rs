//! A flat rectangular surface: the unit every arrangement widget lays out.

use std::any::Any;

use crate::math::{Size, Vec3};
use crate::widget::{Draw, FrameCx, NodeKind, Theme, Widget, WidgetCore};

pub const DEFAULT_PANE_SIZE: Size = Size::new(400.0, 500.0);

#[derive(Debug, Clone)]
pub struct Pane {
    core: WidgetCore,
    size: Size,
    theme: Theme,
    active: bool,
    label: Option<String>,
}

impl Default for Pane {
    fn default() -> Self {
        Self::sized(DEFAULT_PANE_SIZE.width, DEFAULT_PANE_SIZE.height)
    }
}

impl Pane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            core: WidgetCore::default(),
            size: Size::new(width, height),
            theme: Theme::default(),
            active: false,
            label: None,
        }
    }

    pub fn themed(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// The pane's surface at `translation`, for containers that position
    /// it themselves.
    pub fn draw(&self, translation: Vec3, rotation: Vec3) -> Draw {
        Draw::new(
            NodeKind::Pane {
                theme: self.theme,
                active: self.active,
            },
            translation,
            self.size,
        )
        .rotated(rotation)
    }
}

impl Widget for Pane {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn measure(&self) -> Size {
        self.size
    }

    fn tick(&mut self, cx: &mut FrameCx<'_>) {
        let translation = self.core.position() + cx.origin;
        cx.emit(0, self.draw(translation, self.core.rotation));
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
    use crate::widget::{RenderNode, Transform, WidgetExt, WidgetId};

    #[test]
    fn standalone_pane_renders_at_base_offset_and_origin() {
        let mut pane = Pane::sized(100.0, 80.0)
            .themed(Theme::Dark)
            .transformed(Transform::at(1.0, 2.0, -40.0));
        pane.core_mut().base_position = Vec3::new(100.0, 200.0, 0.0);

        let mut nodes: Vec<RenderNode> = Vec::new();
        let mut cx = FrameCx::new(
            WidgetId(0),
            0.016,
            0.0,
            Vec3::new(-10.0, -20.0, 0.0),
            Size::new(800.0, 600.0),
            &mut nodes,
        );
        pane.tick(&mut cx);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].translation, Vec3::new(91.0, 182.0, -40.0));
        assert_eq!(nodes[0].z_index, 460);
        assert_eq!(
            nodes[0].kind,
            NodeKind::Pane {
                theme: Theme::Dark,
                active: false
            }
        );
    }
}
