// ============================================================================
// TEXT RENDERING — glyph layout and rasterization into the canvas
// ============================================================================

use ab_glyph::{Font, FontArc, Glyph, GlyphId, ScaleFont};
use image::Rgba;

use crate::canvas::Surface;

/// Style applied when the text tool commits. Font bytes come from the caller
/// (the engine does no system-font enumeration).
#[derive(Clone, Debug)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 16.0,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// Synthetic italic shear: horizontal offset per pixel of height above the
/// baseline.
const ITALIC_SHEAR: f32 = 0.2;

/// Lay out one line left-aligned at x=0, returning positioned glyphs and the
/// advance width.
fn layout_line(font: &FontArc, text: &str, size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(size);
    let mut glyphs = Vec::new();
    let mut cursor = 0.0f32;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor));
        cursor += scaled.h_advance(id);
        last = Some(id);
    }
    (glyphs, cursor)
}

/// Render `text` into the surface with its top-left anchored at `origin`.
/// Multi-line via '\n'. Returns the advance width of the widest line.
pub fn draw_text(
    surface: &mut Surface,
    font: &FontArc,
    text: &str,
    origin: (i32, i32),
    style: &TextStyle,
    color: Rgba<u8>,
) -> f32 {
    let scaled = font.as_scaled(style.size);
    let ascent = scaled.ascent();
    let line_height = scaled.height() + scaled.line_gap();
    let mut widest = 0.0f32;

    for (line_idx, line) in text.split('\n').enumerate() {
        let (glyphs, advance) = layout_line(font, line, style.size);
        widest = widest.max(advance);
        let baseline_y = origin.1 as f32 + ascent + line_idx as f32 * line_height;

        for &(id, gx) in &glyphs {
            let positioned: Glyph = id.with_scale_and_position(
                style.size,
                ab_glyph::point(origin.0 as f32 + gx, baseline_y),
            );
            let Some(outlined) = font.outline_glyph(positioned) else {
                continue; // whitespace or missing glyph
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                if coverage <= 0.0 {
                    return;
                }
                let abs_y = bounds.min.y + py as f32;
                let mut abs_x = bounds.min.x + px as f32;
                if style.italic {
                    abs_x += (baseline_y - abs_y) * ITALIC_SHEAR;
                }
                blend_coverage(surface, abs_x as i32, abs_y as i32, coverage, color);
                if style.bold {
                    blend_coverage(surface, abs_x as i32 + 1, abs_y as i32, coverage, color);
                }
            });
        }

        if style.underline && advance > 0.0 {
            let y = (baseline_y + 2.0) as i32;
            let thickness = (style.size / 12.0).max(1.0) as i32;
            for dy in 0..thickness {
                for x in 0..advance as i32 {
                    surface.put_pixel(origin.0 + x, y + dy, color);
                }
            }
        }
    }
    widest
}

#[inline]
fn blend_coverage(surface: &mut Surface, x: i32, y: i32, coverage: f32, color: Rgba<u8>) {
    let Some(dst) = surface.pick_color(x, y) else {
        return;
    };
    let a = coverage.clamp(0.0, 1.0) * (color[3] as f32 / 255.0);
    let blend = |s: u8, d: u8| -> u8 { (s as f32 * a + d as f32 * (1.0 - a)).round() as u8 };
    surface.put_pixel(
        x,
        y,
        Rgba([
            blend(color[0], dst[0]),
            blend(color[1], dst[1]),
            blend(color[2], dst[2]),
            dst[3].max((a * 255.0) as u8),
        ]),
    );
}
