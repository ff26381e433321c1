//! Draws a frame of render nodes into a vello scene.
//!
//! Depth is faked with a single-point perspective about the viewport centre:
//! a node at depth `z` scales by `PERSPECTIVE / (PERSPECTIVE - z)`. Y-axis
//! rotation narrows a pane by `|cos θ|`; backfaces are drawn dimmed.

use vello::kurbo::{Affine, Circle, Rect, RoundedRect, Stroke};
use vello::peniko::{Color, Fill, FontData};
use vello::{Glyph, Scene};

use panes::widget::{NodeKind, Theme};
use panes::{RenderNode, Size, Vec2, Vec3};

const PERSPECTIVE: f64 = 1000.0;
const CORNER_RADIUS: f64 = 14.0;
const GRADIENT_BANDS: usize = 48;

const PANE_LIGHT: Color = Color::new([1.0, 0.922, 0.827, 1.0]);
const PANE_DARK: Color = Color::new([0.18, 0.16, 0.20, 1.0]);
const PANE_ACCENT: Color = Color::new([0.85, 0.45, 0.22, 1.0]);
const PANE_BORDER: Color = Color::new([0.87, 0.72, 0.53, 1.0]);
const ACTIVE_BORDER: Color = Color::new([1.0, 1.0, 1.0, 1.0]);
const BAR_COLOR: Color = Color::new([1.0, 1.0, 1.0, 0.35]);
const TEXT_COLOR: Color = Color::new([1.0, 1.0, 1.0, 1.0]);

/// A node's screen footprint after projection.
#[derive(Debug, Clone, Copy)]
struct Projected {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    scale: f64,
    facing: bool,
}

fn project(translation: Vec3, rotation_y: f64, size: Size, viewport: Size) -> Option<Projected> {
    let depth = PERSPECTIVE - translation.z;
    if depth <= 1.0 {
        return None;
    }
    let scale = PERSPECTIVE / depth;
    let center = viewport.half();

    let turn = rotation_y.cos();
    let width = size.width * scale * turn.abs();
    let height = size.height * scale;

    // Scale about the node's own centre, then about the viewport centre.
    let mid = Vec2::new(translation.x + size.width / 2.0, translation.y + size.height / 2.0);
    let sx = center.x + (mid.x - center.x) * scale;
    let sy = center.y + (mid.y - center.y) * scale;

    Some(Projected {
        x: sx - width / 2.0,
        y: sy - height / 2.0,
        width,
        height,
        scale,
        facing: turn >= 0.0,
    })
}

/// Vertical gradient from `top` to `bottom`, as stacked bands.
pub fn draw_background(scene: &mut Scene, viewport: Size, top: panes::Color, bottom: panes::Color) {
    let band = viewport.height / GRADIENT_BANDS as f64;
    for i in 0..GRADIENT_BANDS {
        let t = i as f64 / (GRADIENT_BANDS - 1) as f64;
        let y = i as f64 * band;
        // Overlap by a pixel to avoid seams.
        let rect = Rect::new(0.0, y, viewport.width, y + band + 1.0);
        scene.fill(Fill::NonZero, Affine::IDENTITY, to_peniko(top.mix(bottom, t), 1.0), None, &rect);
    }
}

/// Paint `nodes` back to front.
pub fn draw_nodes(scene: &mut Scene, nodes: &[RenderNode], viewport: Size, font: Option<&FontData>) {
    let mut order: Vec<&RenderNode> = nodes.iter().filter(|n| n.opacity > 0.0).collect();
    order.sort_by_key(|n| n.z_index);

    for node in order {
        let Some(p) = project(node.translation, node.rotation.y, node.size, viewport) else { continue };
        match &node.kind {
            NodeKind::Pane { theme, active } => draw_pane(scene, &p, *theme, *active, node.opacity, node.blur),
            NodeKind::Text { text, font_size } => {
                draw_text(scene, text, *font_size * p.scale, p.x, p.y, TEXT_COLOR.multiply_alpha(node.opacity as f32), font)
            }
            NodeKind::Particle { color } => {
                let circle = Circle::new((p.x + p.width / 2.0, p.y + p.height / 2.0), p.height / 2.0);
                scene.fill(Fill::NonZero, Affine::IDENTITY, to_peniko(*color, node.opacity), None, &circle);
            }
            NodeKind::Bar => {
                let rect = RoundedRect::new(p.x, p.y, p.x + p.width, p.y + p.height, p.width / 2.0);
                scene.fill(Fill::NonZero, Affine::IDENTITY, BAR_COLOR.multiply_alpha(node.opacity as f32), None, &rect);
            }
        }
    }
}

fn draw_pane(scene: &mut Scene, p: &Projected, theme: Theme, active: bool, opacity: f64, blur: f64) {
    let base = match theme {
        Theme::Light => PANE_LIGHT,
        Theme::Dark => PANE_DARK,
        Theme::Accent => PANE_ACCENT,
    };
    let alpha = (if p.facing { opacity } else { opacity * 0.5 }) as f32;
    let radius = CORNER_RADIUS * p.scale;

    if blur > 0.5 {
        // A soft halo stands in for a real blur.
        let spread = blur * p.scale;
        let halo = RoundedRect::new(
            p.x - spread,
            p.y - spread,
            p.x + p.width + spread,
            p.y + p.height + spread,
            radius + spread,
        );
        scene.fill(Fill::NonZero, Affine::IDENTITY, base.multiply_alpha(alpha * 0.25), None, &halo);
    }

    let rect = RoundedRect::new(p.x, p.y, p.x + p.width, p.y + p.height, radius);
    scene.fill(Fill::NonZero, Affine::IDENTITY, base.multiply_alpha(alpha), None, &rect);

    let (border, width) = if active { (ACTIVE_BORDER, 3.0) } else { (PANE_BORDER, 1.5) };
    scene.stroke(&Stroke::new(width * p.scale), Affine::IDENTITY, border.multiply_alpha(alpha), None, &rect);
}

fn to_peniko(color: panes::Color, alpha: f64) -> Color {
    let [r, g, b] = color.to_f32();
    Color::new([r, g, b, alpha.clamp(0.0, 1.0) as f32])
}

/// Text with the top-left corner at `(x, y)`. Lines split on `\n`.
fn draw_text(scene: &mut Scene, text: &str, font_size: f64, x: f64, y: f64, color: Color, font: Option<&FontData>) {
    let Some(font) = font else {
        draw_text_blocks(scene, text, font_size, x, y, color);
        return;
    };

    let glyphs = layout_lines(text, font, font_size as f32, x, y);
    if glyphs.is_empty() {
        return;
    }
    scene
        .draw_glyphs(font)
        .font_size(font_size as f32)
        .brush(color)
        .draw(Fill::NonZero, glyphs.into_iter());
}

fn layout_lines(text: &str, font: &FontData, font_size: f32, x: f64, y: f64) -> Vec<Glyph> {
    let Ok(font_ref) = skrifa::FontRef::from_index(font.data.as_ref(), font.index) else {
        return Vec::new();
    };

    use skrifa::MetadataProvider;
    let charmap = font_ref.charmap();
    let metrics = font_ref.glyph_metrics(skrifa::instance::Size::new(font_size), skrifa::instance::LocationRef::default());

    let line_height = font_size as f64 * 1.25;
    let mut glyphs = Vec::new();

    for (row, line) in text.lines().enumerate() {
        let mut cursor = x;
        // Glyph origins sit on the baseline.
        let baseline = y + font_size as f64 + row as f64 * line_height;
        for ch in line.chars() {
            let gid = charmap.map(ch).unwrap_or_default();
            glyphs.push(Glyph {
                id: gid.to_u32(),
                x: cursor as f32,
                y: baseline as f32,
            });
            cursor += metrics.advance_width(gid).unwrap_or(font_size * 0.55) as f64;
        }
    }
    glyphs
}

/// Fallback without a system font: one translucent block per character.
fn draw_text_blocks(scene: &mut Scene, text: &str, font_size: f64, x: f64, y: f64, color: Color) {
    let advance = font_size * 0.55;
    let line_height = font_size * 1.25;
    for (row, line) in text.lines().enumerate() {
        let top = y + row as f64 * line_height + font_size * 0.2;
        for (col, ch) in line.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = x + col as f64 * advance;
            let rect = Rect::new(left, top, left + advance * 0.8, top + font_size * 0.8);
            scene.fill(Fill::NonZero, Affine::IDENTITY, color.multiply_alpha(0.6), None, &rect);
        }
    }
}

// --- Font loading ---

fn load_system_font(names: &[&str]) -> Option<FontData> {
    let dirs = [
        "/System/Library/Fonts/",
        "/System/Library/Fonts/Supplemental/",
        "/Library/Fonts/",
        "/usr/share/fonts/truetype/dejavu/",
        "/usr/share/fonts/truetype/",
        "/usr/share/fonts/opentype/",
    ];
    let extensions = ["ttf", "otf", "ttc"];

    names.iter().find_map(|name| {
        dirs.iter().find_map(|dir| {
            extensions.iter().find_map(|ext| {
                let path = format!("{dir}{name}.{ext}");
                std::fs::read(&path).ok().map(|data| FontData::new(data.into(), 0))
            })
        })
    })
}

/// First available sans-serif face, if any.
pub fn load_font() -> Option<FontData> {
    load_system_font(&["Avenir Next", "Helvetica", "Arial", "DejaVuSans", "LiberationSans-Regular"])
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(800.0, 600.0);
    const CARD: Size = Size::new(100.0, 50.0);

    #[test]
    fn flat_node_projects_to_itself() {
        let p = project(Vec3::new(100.0, 200.0, 0.0), 0.0, CARD, VIEWPORT).unwrap();
        assert!((p.x - 100.0).abs() < 1e-9);
        assert!((p.y - 200.0).abs() < 1e-9);
        assert!((p.width - 100.0).abs() < 1e-9);
        assert!(p.facing);
    }

    #[test]
    fn receding_node_shrinks_toward_centre() {
        let p = project(Vec3::new(0.0, 0.0, -1000.0), 0.0, CARD, VIEWPORT).unwrap();
        assert!((p.scale - 0.5).abs() < 1e-9);
        assert!((p.width - 50.0).abs() < 1e-9);
        // Node centre (50, 25) halves its distance to (400, 300).
        assert!((p.x + p.width / 2.0 - 225.0).abs() < 1e-9);
    }

    #[test]
    fn turned_away_node_is_backfacing() {
        let p = project(Vec3::ZERO, std::f64::consts::PI, CARD, VIEWPORT).unwrap();
        assert!(!p.facing);
    }

    #[test]
    fn node_behind_the_eye_is_culled() {
        assert!(project(Vec3::new(0.0, 0.0, 1200.0), 0.0, CARD, VIEWPORT).is_none());
    }
}
