use image::{Rgba, RgbaImage};

use crate::canvas::{PixelRect, Surface, TRANSPARENT};

// ============================================================================
// SELECTION MODEL — rectangular and free-form selections
// ============================================================================

/// Consecutive free-form vertices closer than this are dropped, bounding the
/// vertex count during a drag.
pub const FREEFORM_POINT_SPACING: f32 = 3.0;

/// What the active selection is currently doing with the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransformMode {
    #[default]
    Idle,
    Moving,
    Resizing,
}

// ----------------------------------------------------------------------------
// Rectangular selection
// ----------------------------------------------------------------------------

/// A rectangular selection. While resizing it is just a rubber-band rect;
/// after [`capture`](RectSelection::capture) it holds the detached pixel
/// content and the surface region is background-filled.
///
/// Invariant: when `content` is present its dimensions equal the rect's.
#[derive(Clone)]
pub struct RectSelection {
    pub rect: PixelRect,
    pub content: Option<RgbaImage>,
    pub mode: TransformMode,
    /// Fixed corner while resizing.
    anchor: (i32, i32),
    /// Pointer offset from the rect origin while moving.
    grab: (i32, i32),
}

impl RectSelection {
    /// Begin a new selection as a zero-size rect at the press point.
    pub fn begin(x: i32, y: i32) -> Self {
        Self {
            rect: PixelRect::new(x, y, 0, 0),
            content: None,
            mode: TransformMode::Resizing,
            anchor: (x, y),
            grab: (0, 0),
        }
    }

    /// Reconstruct a live selection from detached content (clipboard paste).
    /// The rect always takes the content's dimensions.
    pub fn from_content(x: i32, y: i32, content: RgbaImage) -> Self {
        Self {
            rect: PixelRect::new(x, y, content.width(), content.height()),
            content: Some(content),
            mode: TransformMode::Idle,
            anchor: (x, y),
            grab: (0, 0),
        }
    }

    /// Grow/shrink the rubber-band: the corner opposite the anchor follows
    /// the pointer.
    pub fn drag_resize(&mut self, x: i32, y: i32) {
        if self.mode != TransformMode::Resizing {
            return;
        }
        self.rect = PixelRect::from_corners(self.anchor.0, self.anchor.1, x, y);
    }

    /// Detach the covered pixels and erase the region with `background`.
    /// A degenerate (empty) rect leaves the selection contentless.
    pub fn capture(&mut self, surface: &mut Surface, background: Rgba<u8>) {
        self.mode = TransformMode::Idle;
        if self.rect.is_empty() {
            return;
        }
        self.content = Some(surface.copy_region(self.rect));
        surface.fill_rect(self.rect, background);
    }

    pub fn is_live(&self) -> bool {
        self.content.is_some()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rect.contains(x, y)
    }

    /// Pointer-down inside a live selection: start translating it.
    pub fn begin_move(&mut self, x: i32, y: i32) {
        self.mode = TransformMode::Moving;
        self.grab = (x - self.rect.x, y - self.rect.y);
    }

    pub fn drag_move(&mut self, x: i32, y: i32) {
        if self.mode != TransformMode::Moving {
            return;
        }
        self.rect.x = x - self.grab.0;
        self.rect.y = y - self.grab.1;
    }

    pub fn end_drag(&mut self) {
        self.mode = TransformMode::Idle;
    }

    /// Blit the detached content back at the rect's current top-left.
    /// Consumes the selection either way.
    pub fn commit(self, surface: &mut Surface) {
        if let Some(content) = self.content {
            surface.blit(&content, self.rect.x, self.rect.y);
        }
    }

    /// Drop the content without blitting; the erased region stays erased.
    pub fn discard(self) {}
}

// ----------------------------------------------------------------------------
// Free-form (polygon) selection
// ----------------------------------------------------------------------------

/// A free-form selection built by dragging a closed polygon.
///
/// `points` keeps the original vertex coordinates; the captured content moves
/// independently via `offset`, so hit-testing and committing translate the
/// polygon by the current offset.
#[derive(Clone)]
pub struct FreeformSelection {
    pub points: Vec<(i32, i32)>,
    pub bounds: PixelRect,
    pub content: Option<RgbaImage>,
    pub offset: (i32, i32),
    pub dragging: bool,
    grab: (i32, i32),
}

impl FreeformSelection {
    pub fn begin(x: i32, y: i32) -> Self {
        Self {
            points: vec![(x, y)],
            bounds: PixelRect::new(x, y, 0, 0),
            content: None,
            offset: (0, 0),
            dragging: false,
            grab: (0, 0),
        }
    }

    /// Reconstruct a live selection from clipboard geometry. `points` may be
    /// empty (descriptor carried only a rectangle), in which case hit-testing
    /// falls back to the bounding box.
    pub fn from_content(points: Vec<(i32, i32)>, bounds: PixelRect, content: RgbaImage) -> Self {
        Self {
            points,
            bounds,
            content: Some(content),
            offset: (0, 0),
            dragging: false,
            grab: (0, 0),
        }
    }

    /// Append a vertex if it is farther than [`FREEFORM_POINT_SPACING`] from
    /// the last one.
    pub fn add_point(&mut self, x: i32, y: i32) {
        if let Some(&(lx, ly)) = self.points.last() {
            let dx = (x - lx) as f32;
            let dy = (y - ly) as f32;
            if (dx * dx + dy * dy).sqrt() <= FREEFORM_POINT_SPACING {
                return;
            }
        }
        self.points.push((x, y));
    }

    /// A closed polygon needs at least three vertices.
    pub fn is_closed_polygon(&self) -> bool {
        self.points.len() >= 3
    }

    /// Detach the pixels inside the polygon path into a transparent-background
    /// image and background-fill the polygon area (not its bounding box) in
    /// the surface. Pixels inside the bbox but outside the path are untouched.
    pub fn capture(&mut self, surface: &mut Surface, background: Rgba<u8>) {
        if !self.is_closed_polygon() {
            return;
        }
        self.bounds = polygon_bounds(&self.points);
        if self.bounds.is_empty() {
            return;
        }
        let mut content = RgbaImage::from_pixel(self.bounds.w, self.bounds.h, TRANSPARENT);
        for dy in 0..self.bounds.h {
            for dx in 0..self.bounds.w {
                let sx = self.bounds.x + dx as i32;
                let sy = self.bounds.y + dy as i32;
                if !point_in_polygon(&self.points, sx, sy) {
                    continue;
                }
                if let Some(px) = surface.pick_color(sx, sy) {
                    content.put_pixel(dx, dy, px);
                    surface.put_pixel(sx, sy, background);
                }
            }
        }
        self.content = Some(content);
        self.offset = (0, 0);
    }

    pub fn is_live(&self) -> bool {
        self.content.is_some()
    }

    /// Bounding rect translated by the current drag offset.
    pub fn current_bounds(&self) -> PixelRect {
        PixelRect::new(
            self.bounds.x + self.offset.0,
            self.bounds.y + self.offset.1,
            self.bounds.w,
            self.bounds.h,
        )
    }

    /// Hit-test against the polygon path translated by the current offset.
    /// Falls back to bounding-box containment when no path is available
    /// (a pasted selection that only carried a rectangle).
    pub fn contains(&self, x: i32, y: i32) -> bool {
        if self.points.len() >= 3 {
            point_in_polygon(&self.points, x - self.offset.0, y - self.offset.1)
        } else {
            self.current_bounds().contains(x, y)
        }
    }

    pub fn begin_move(&mut self, x: i32, y: i32) {
        self.dragging = true;
        self.grab = (x - self.offset.0, y - self.offset.1);
    }

    pub fn drag_move(&mut self, x: i32, y: i32) {
        if !self.dragging {
            return;
        }
        self.offset = (x - self.grab.0, y - self.grab.1);
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Blit the detached content back at the translated bounding box.
    pub fn commit(self, surface: &mut Surface) {
        if let Some(content) = self.content {
            let b = PixelRect::new(
                self.bounds.x + self.offset.0,
                self.bounds.y + self.offset.1,
                self.bounds.w,
                self.bounds.h,
            );
            surface.blit(&content, b.x, b.y);
        }
    }

    pub fn discard(self) {}
}

// ----------------------------------------------------------------------------
// Polygon helpers
// ----------------------------------------------------------------------------

pub fn polygon_bounds(points: &[(i32, i32)]) -> PixelRect {
    let Some(&(fx, fy)) = points.first() else {
        return PixelRect::new(0, 0, 0, 0);
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (fx, fy, fx, fy);
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    PixelRect::new(
        min_x,
        min_y,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    )
}

/// Even-odd ray-cast test, sampling at the pixel center so integer-vertex
/// polygons get stable inside/outside classification.
pub fn point_in_polygon(points: &[(i32, i32)], x: i32, y: i32) -> bool {
    if points.len() < 3 {
        return false;
    }
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = (points[i].0 as f32, points[i].1 as f32);
        let (xj, yj) = (points[j].0 as f32, points[j].1 as f32);
        if ((yi > py) != (yj > py))
            && (px < (xj - xi) * (py - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};

    #[test]
    fn rect_capture_then_commit_restores_surface() {
        let mut s = Surface::new(10, 10, BLACK);
        let before = s.clone();
        let mut sel = RectSelection::begin(2, 2);
        sel.drag_resize(6, 6);
        sel.capture(&mut s, WHITE);
        // Region is erased while detached.
        assert_eq!(s.pick_color(3, 3), Some(WHITE));
        sel.commit(&mut s);
        assert!(s == before);
    }

    #[test]
    fn rect_discard_leaves_region_erased() {
        let mut s = Surface::new(10, 10, BLACK);
        let mut sel = RectSelection::begin(0, 0);
        sel.drag_resize(5, 5);
        sel.capture(&mut s, WHITE);
        sel.discard();
        assert_eq!(s.pick_color(2, 2), Some(WHITE));
        assert_eq!(s.pick_color(7, 7), Some(BLACK));
    }

    #[test]
    fn rect_content_dims_match_rect() {
        let mut s = Surface::new(20, 20, BLACK);
        let mut sel = RectSelection::begin(4, 5);
        sel.drag_resize(14, 11);
        sel.capture(&mut s, WHITE);
        let content = sel.content.as_ref().unwrap();
        assert_eq!((content.width(), content.height()), (sel.rect.w, sel.rect.h));
    }

    #[test]
    fn freeform_capture_spares_pixels_outside_path() {
        let mut s = Surface::new(20, 20, BLACK);
        // Right triangle covering the upper-left of its bbox.
        let mut sel = FreeformSelection::begin(0, 0);
        sel.points = vec![(0, 0), (10, 0), (0, 10)];
        sel.capture(&mut s, WHITE);
        // Inside the triangle: erased and captured.
        assert_eq!(s.pick_color(2, 2), Some(WHITE));
        // Inside the bbox but outside the triangle: untouched.
        assert_eq!(s.pick_color(9, 9), Some(BLACK));
        let content = sel.content.as_ref().unwrap();
        assert_eq!(content.get_pixel(2, 2)[3], 255);
        assert_eq!(content.get_pixel(9, 9)[3], 0);
    }

    #[test]
    fn freeform_hit_test_follows_offset() {
        let mut s = Surface::new(30, 30, BLACK);
        let mut sel = FreeformSelection::begin(0, 0);
        sel.points = vec![(0, 0), (10, 0), (10, 10), (0, 10)];
        sel.capture(&mut s, WHITE);
        assert!(sel.contains(5, 5));
        sel.begin_move(5, 5);
        sel.drag_move(20, 5);
        sel.end_drag();
        assert!(!sel.contains(5, 5));
        assert!(sel.contains(20, 5));
    }

    #[test]
    fn freeform_point_spacing_limits_vertices() {
        let mut sel = FreeformSelection::begin(0, 0);
        sel.add_point(1, 1); // too close, dropped
        sel.add_point(2, 2); // still within 3px of (0,0), dropped
        sel.add_point(5, 5);
        assert_eq!(sel.points.len(), 2);
    }
}
