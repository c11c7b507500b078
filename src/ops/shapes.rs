// ============================================================================
// SHAPE RASTERIZATION — lines, closed shapes, polygons, curves
// ============================================================================

use image::Rgba;

use crate::canvas::{PixelRect, Surface};
use crate::components::selection::point_in_polygon;

/// Interpolated points per Catmull-Rom segment for a committed curve.
pub const CURVE_SAMPLES_PER_SEGMENT: usize = 20;
/// Reduced sampling used while the curve is still a live preview.
pub const CURVE_PREVIEW_SAMPLES_PER_SEGMENT: usize = 10;

/// How a closed shape is painted relative to foreground/background color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShapeFillMode {
    /// Outline only, no fill.
    #[default]
    Outline,
    /// Fill only, no outline.
    Filled,
    /// Outline plus fill.
    Both,
}

// ----------------------------------------------------------------------------
// Lines and stamps
// ----------------------------------------------------------------------------

/// Stamp a filled disc of diameter `width` centred at (cx, cy).
/// Width ≤ 1 degenerates to a single pixel.
pub fn stamp_disc(surface: &mut Surface, cx: f32, cy: f32, width: f32, color: Rgba<u8>) {
    if width <= 1.0 {
        surface.put_pixel(cx.round() as i32, cy.round() as i32, color);
        return;
    }
    let r = width * 0.5;
    let r2 = r * r;
    let x0 = (cx - r).floor() as i32;
    let x1 = (cx + r).ceil() as i32;
    let y0 = (cy - r).floor() as i32;
    let y1 = (cy + r).ceil() as i32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                surface.put_pixel(x, y, color);
            }
        }
    }
}

/// Draw a connected line segment by stamping discs along the span at
/// half-pixel steps. Pixel output depends only on the image-space endpoints,
/// never on the display zoom.
pub fn draw_line(
    surface: &mut Surface,
    from: (f32, f32),
    to: (f32, f32),
    width: f32,
    color: Rgba<u8>,
) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let dist = (dx * dx + dy * dy).sqrt();
    let steps = (dist * 2.0).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_disc(surface, from.0 + dx * t, from.1 + dy * t, width, color);
    }
}

/// Draw a polyline through `points`.
pub fn draw_polyline(surface: &mut Surface, points: &[(f32, f32)], width: f32, color: Rgba<u8>) {
    if points.len() == 1 {
        stamp_disc(surface, points[0].0, points[0].1, width, color);
        return;
    }
    for pair in points.windows(2) {
        draw_line(surface, pair[0], pair[1], width, color);
    }
}

// ----------------------------------------------------------------------------
// SDF shapes — rectangle, rounded rectangle, ellipse
// ----------------------------------------------------------------------------
// Signed distance (negative = inside) sampled at pixel centers; the fill mode
// decides which band of distances gets outline vs. fill color.

#[inline]
fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

#[inline]
fn sdf_rounded_box(px: f32, py: f32, hx: f32, hy: f32, r: f32) -> f32 {
    let r = r.min(hx).min(hy);
    sdf_box(px, py, hx - r, hy - r) - r
}

#[inline]
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    if rx <= 0.0 || ry <= 0.0 {
        return f32::MAX;
    }
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    // Distance from the normalised circle surface, scaled back.
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

fn paint_sdf<F: Fn(f32, f32) -> f32>(
    surface: &mut Surface,
    rect: PixelRect,
    sdf: F,
    mode: ShapeFillMode,
    outline: Rgba<u8>,
    fill: Rgba<u8>,
    outline_width: f32,
) {
    if rect.is_empty() {
        return;
    }
    let (cx, cy) = (
        rect.x as f32 + rect.w as f32 * 0.5,
        rect.y as f32 + rect.h as f32 * 0.5,
    );
    let half_w = outline_width.max(1.0) * 0.5;
    // Pad by the outline half-width so thick outlines are not clipped.
    let pad = half_w.ceil() as i32 + 1;
    let y0 = rect.y - pad;
    let y1 = rect.y + rect.h as i32 + pad;
    let x0 = rect.x - pad;
    let x1 = rect.x + rect.w as i32 + pad;
    for y in y0..y1 {
        for x in x0..x1 {
            let d = sdf(x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            match mode {
                ShapeFillMode::Outline => {
                    if d.abs() <= half_w {
                        surface.put_pixel(x, y, outline);
                    }
                }
                ShapeFillMode::Filled => {
                    if d <= 0.0 {
                        surface.put_pixel(x, y, fill);
                    }
                }
                ShapeFillMode::Both => {
                    if d.abs() <= half_w {
                        surface.put_pixel(x, y, outline);
                    } else if d < 0.0 {
                        surface.put_pixel(x, y, fill);
                    }
                }
            }
        }
    }
}

pub fn draw_rectangle(
    surface: &mut Surface,
    rect: PixelRect,
    mode: ShapeFillMode,
    outline: Rgba<u8>,
    fill: Rgba<u8>,
    outline_width: f32,
) {
    let hx = rect.w as f32 * 0.5;
    let hy = rect.h as f32 * 0.5;
    paint_sdf(surface, rect, |px, py| sdf_box(px, py, hx, hy), mode, outline, fill, outline_width);
}

pub fn draw_rounded_rectangle(
    surface: &mut Surface,
    rect: PixelRect,
    corner_radius: f32,
    mode: ShapeFillMode,
    outline: Rgba<u8>,
    fill: Rgba<u8>,
    outline_width: f32,
) {
    let hx = rect.w as f32 * 0.5;
    let hy = rect.h as f32 * 0.5;
    paint_sdf(
        surface,
        rect,
        |px, py| sdf_rounded_box(px, py, hx, hy, corner_radius),
        mode,
        outline,
        fill,
        outline_width,
    );
}

pub fn draw_ellipse(
    surface: &mut Surface,
    rect: PixelRect,
    mode: ShapeFillMode,
    outline: Rgba<u8>,
    fill: Rgba<u8>,
    outline_width: f32,
) {
    let rx = rect.w as f32 * 0.5;
    let ry = rect.h as f32 * 0.5;
    paint_sdf(surface, rect, |px, py| sdf_ellipse(px, py, rx, ry), mode, outline, fill, outline_width);
}

// ----------------------------------------------------------------------------
// Polygons
// ----------------------------------------------------------------------------

/// Draw a closed polygon honoring the fill mode: interior filled per-pixel
/// (even-odd), outline stroked along the closed edge loop.
pub fn draw_polygon(
    surface: &mut Surface,
    points: &[(i32, i32)],
    mode: ShapeFillMode,
    outline: Rgba<u8>,
    fill: Rgba<u8>,
    outline_width: f32,
) {
    if points.len() < 3 {
        return;
    }
    if mode != ShapeFillMode::Outline {
        let bounds = crate::components::selection::polygon_bounds(points);
        if let Some(r) = bounds.clamped(surface.width(), surface.height()) {
            for y in r.y..r.y + r.h as i32 {
                for x in r.x..r.x + r.w as i32 {
                    if point_in_polygon(points, x, y) {
                        surface.put_pixel(x, y, fill);
                    }
                }
            }
        }
    }
    if mode != ShapeFillMode::Filled {
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            draw_line(
                surface,
                (a.0 as f32, a.1 as f32),
                (b.0 as f32, b.1 as f32),
                outline_width,
                outline,
            );
        }
    }
}

// ----------------------------------------------------------------------------
// Catmull-Rom curves
// ----------------------------------------------------------------------------

/// One point of the Catmull-Rom segment (p1..p2), t ∈ [0, 1].
#[inline]
pub fn catmull_rom_point(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    t: f32,
) -> (f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let x = 0.5
        * ((2.0 * p1.0)
            + (-p0.0 + p2.0) * t
            + (2.0 * p0.0 - 5.0 * p1.0 + 4.0 * p2.0 - p3.0) * t2
            + (-p0.0 + 3.0 * p1.0 - 3.0 * p2.0 + p3.0) * t3);
    let y = 0.5
        * ((2.0 * p1.1)
            + (-p0.1 + p2.1) * t
            + (2.0 * p0.1 - 5.0 * p1.1 + 4.0 * p2.1 - p3.1) * t2
            + (-p0.1 + 3.0 * p1.1 - 3.0 * p2.1 + p3.1) * t3);
    (x, y)
}

/// Sample a piecewise Catmull-Rom spline through every control point.
///
/// Two control points degenerate to a straight segment; otherwise the first
/// and last points are duplicated as virtual pre/post controls so the spline
/// interpolates the endpoints.
pub fn sample_catmull_rom(control: &[(f32, f32)], samples_per_segment: usize) -> Vec<(f32, f32)> {
    match control.len() {
        0 => Vec::new(),
        1 => vec![control[0]],
        2 => vec![control[0], control[1]],
        _ => {
            let n = control.len();
            let at = |i: isize| -> (f32, f32) {
                control[i.clamp(0, n as isize - 1) as usize]
            };
            let mut out = Vec::with_capacity((n - 1) * samples_per_segment + 1);
            out.push(control[0]);
            for seg in 0..n - 1 {
                let p0 = at(seg as isize - 1);
                let p1 = at(seg as isize);
                let p2 = at(seg as isize + 1);
                let p3 = at(seg as isize + 2);
                for i in 1..=samples_per_segment {
                    let t = i as f32 / samples_per_segment as f32;
                    out.push(catmull_rom_point(p0, p1, p2, p3, t));
                }
            }
            out
        }
    }
}

/// Render a curve through `control` points.
pub fn draw_curve(
    surface: &mut Surface,
    control: &[(f32, f32)],
    width: f32,
    color: Rgba<u8>,
    samples_per_segment: usize,
) {
    let sampled = sample_catmull_rom(control, samples_per_segment);
    draw_polyline(surface, &sampled, width, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};

    #[test]
    fn line_is_connected() {
        let mut s = Surface::new(20, 20, WHITE);
        draw_line(&mut s, (2.0, 10.0), (17.0, 10.0), 1.0, BLACK);
        for x in 2..=17 {
            assert_eq!(s.pick_color(x, 10), Some(BLACK), "gap at x={}", x);
        }
    }

    #[test]
    fn filled_rectangle_covers_interior_only() {
        let mut s = Surface::new(20, 20, WHITE);
        draw_rectangle(&mut s, PixelRect::new(5, 5, 8, 8), ShapeFillMode::Filled, BLACK, BLACK, 1.0);
        assert_eq!(s.pick_color(9, 9), Some(BLACK));
        assert_eq!(s.pick_color(3, 3), Some(WHITE));
        assert_eq!(s.pick_color(15, 15), Some(WHITE));
    }

    #[test]
    fn outline_rectangle_leaves_interior() {
        let mut s = Surface::new(20, 20, WHITE);
        draw_rectangle(&mut s, PixelRect::new(4, 4, 10, 10), ShapeFillMode::Outline, BLACK, BLACK, 1.0);
        assert_eq!(s.pick_color(9, 9), Some(WHITE));
        assert_eq!(s.pick_color(4, 9), Some(BLACK));
    }

    #[test]
    fn both_mode_uses_fill_and_outline_colors() {
        let red = image::Rgba([255, 0, 0, 255]);
        let mut s = Surface::new(20, 20, WHITE);
        draw_rectangle(&mut s, PixelRect::new(2, 2, 14, 14), ShapeFillMode::Both, BLACK, red, 1.0);
        assert_eq!(s.pick_color(9, 9), Some(red));
        assert_eq!(s.pick_color(2, 9), Some(BLACK));
    }

    #[test]
    fn spline_interpolates_control_points() {
        let control = [(0.0, 0.0), (10.0, 5.0), (20.0, 0.0)];
        let sampled = sample_catmull_rom(&control, CURVE_SAMPLES_PER_SEGMENT);
        assert_eq!(sampled.len(), 2 * CURVE_SAMPLES_PER_SEGMENT + 1);
        assert_eq!(sampled[0], (0.0, 0.0));
        let mid = sampled[CURVE_SAMPLES_PER_SEGMENT];
        assert!((mid.0 - 10.0).abs() < 1e-4 && (mid.1 - 5.0).abs() < 1e-4);
        assert_eq!(*sampled.last().unwrap(), (20.0, 0.0));
    }

    #[test]
    fn two_point_curve_is_a_straight_line() {
        let sampled = sample_catmull_rom(&[(0.0, 0.0), (9.0, 9.0)], CURVE_SAMPLES_PER_SEGMENT);
        assert_eq!(sampled, vec![(0.0, 0.0), (9.0, 9.0)]);
    }

    #[test]
    fn polygon_fill_respects_even_odd_interior() {
        let mut s = Surface::new(30, 30, WHITE);
        let tri = [(5, 5), (25, 5), (5, 25)];
        draw_polygon(&mut s, &tri, ShapeFillMode::Filled, BLACK, BLACK, 1.0);
        assert_eq!(s.pick_color(8, 8), Some(BLACK));
        assert_eq!(s.pick_color(24, 24), Some(WHITE));
    }
}
