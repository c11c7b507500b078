use image::{Rgba, RgbaImage};
use rayon::prelude::*;

// ============================================================================
// GEOMETRY
// ============================================================================

/// Integer pixel rectangle. `x`/`y` may be negative (partially off-canvas
/// selections); width/height are always the stored content size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Normalised rect spanning two corner points (any order).
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            w: (x0 - x1).unsigned_abs(),
            h: (y0 - y1).unsigned_abs(),
        }
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && px < self.x + self.w as i32
            && py < self.y + self.h as i32
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w as i32 / 2, self.y + self.h as i32 / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Intersection with a `w`×`h` canvas anchored at the origin.
    /// Returns the clamped rect, or None when fully outside.
    pub fn clamped(&self, w: u32, h: u32) -> Option<PixelRect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.w as i32).min(w as i32);
        let y1 = (self.y + self.h as i32).min(h as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

// ============================================================================
// SURFACE — the mutable raster canvas
// ============================================================================

/// Safety cap on flood-fill traversal: at most this many pixels are filled
/// before the fill silently truncates.
pub const FLOOD_FILL_PIXEL_CAP: usize = 50_000;

/// Hard clamp on surface dimensions (either axis).
const MAX_DIMENSION: u32 = 16_384;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// The in-memory pixel buffer representing the canvas.
///
/// All geometry-accepting operations treat out-of-bounds points as silent
/// no-ops; pointer imprecision must never surface as an error.
#[derive(Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Create a surface filled with `background`. Zero or absurd dimensions
    /// are clamped so the invariant `width > 0 && height > 0` always holds.
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        let (width, height) = Self::clamp_dims(width, height);
        Self {
            pixels: RgbaImage::from_pixel(width, height, background),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        if pixels.width() == 0 || pixels.height() == 0 {
            log::warn!("Surface::from_image: empty image, substituting 1×1");
            return Self::new(1, 1, WHITE);
        }
        Self { pixels }
    }

    fn clamp_dims(width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            let w = width.clamp(1, MAX_DIMENSION);
            let h = height.clamp(1, MAX_DIMENSION);
            log::warn!("Surface: dimensions {}×{} clamped to {}×{}", width, height, w, h);
            (w, h)
        } else {
            (width, height)
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Replace the entire buffer (undo/redo, file load, whole-image transform).
    pub fn replace(&mut self, pixels: RgbaImage) {
        if pixels.width() == 0 || pixels.height() == 0 {
            log::warn!("Surface::replace: refused empty buffer");
            return;
        }
        self.pixels = pixels;
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Pixel color at `point`, or None outside bounds.
    pub fn pick_color(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if self.in_bounds(x, y) {
            Some(*self.pixels.get_pixel(x as u32, y as u32))
        } else {
            None
        }
    }

    /// Set one pixel; out-of-bounds is a silent no-op.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if self.in_bounds(x, y) {
            self.pixels.put_pixel(x as u32, y as u32, color);
        }
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.pixels.pixels_mut() {
            *px = color;
        }
    }

    /// Fill a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba<u8>) {
        let Some(r) = rect.clamped(self.width(), self.height()) else {
            return;
        };
        for y in r.y..r.y + r.h as i32 {
            for x in r.x..r.x + r.w as i32 {
                self.pixels.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Copy a region out of the surface. Pixels outside the canvas come back
    /// transparent so a partially off-canvas selection still captures cleanly.
    pub fn copy_region(&self, rect: PixelRect) -> RgbaImage {
        let w = rect.w.max(1);
        let h = rect.h.max(1);
        let mut out = RgbaImage::from_pixel(w, h, TRANSPARENT);
        for dy in 0..rect.h {
            for dx in 0..rect.w {
                let sx = rect.x + dx as i32;
                let sy = rect.y + dy as i32;
                if self.in_bounds(sx, sy) {
                    out.put_pixel(dx, dy, *self.pixels.get_pixel(sx as u32, sy as u32));
                }
            }
        }
        out
    }

    /// Blit `src` at (x, y) with source-over alpha: fully transparent source
    /// pixels are skipped, fully opaque ones replace, in between blends.
    pub fn blit(&mut self, src: &RgbaImage, x: i32, y: i32) {
        for (dx, dy, &px) in src.enumerate_pixels() {
            let tx = x + dx as i32;
            let ty = y + dy as i32;
            if !self.in_bounds(tx, ty) {
                continue;
            }
            match px[3] {
                0 => {}
                255 => self.pixels.put_pixel(tx as u32, ty as u32, px),
                a => {
                    let dst = self.pixels.get_pixel_mut(tx as u32, ty as u32);
                    let af = a as u32;
                    let inv = 255 - af;
                    for c in 0..3 {
                        dst[c] = ((px[c] as u32 * af + dst[c] as u32 * inv) / 255) as u8;
                    }
                    dst[3] = (af + dst[3] as u32 * inv / 255).min(255) as u8;
                }
            }
        }
    }

    /// Resize the canvas without scaling content: old pixels stay anchored at
    /// the top-left, newly exposed area is filled with `background`.
    pub fn resize(&mut self, width: u32, height: u32, background: Rgba<u8>) {
        let (width, height) = Self::clamp_dims(width, height);
        if width == self.width() && height == self.height() {
            return;
        }
        let mut out = RgbaImage::from_pixel(width, height, background);
        let copy_w = width.min(self.width());
        let copy_h = height.min(self.height());
        for y in 0..copy_h {
            for x in 0..copy_w {
                out.put_pixel(x, y, *self.pixels.get_pixel(x, y));
            }
        }
        self.pixels = out;
    }

    /// Iterative 4-connected flood fill starting at (x, y).
    ///
    /// Fills only pixels exactly matching the origin's color, fills at most
    /// [`FLOOD_FILL_PIXEL_CAP`] pixels (the fill truncates past the cap), and
    /// is a no-op when the origin already has the fill color or lies outside
    /// the canvas. Returns the number of pixels changed.
    pub fn flood_fill(&mut self, x: i32, y: i32, color: Rgba<u8>) -> usize {
        if !self.in_bounds(x, y) {
            return 0;
        }
        let w = self.width() as usize;
        let h = self.height() as usize;
        let seed = y as usize * w + x as usize;
        let target = *self.pixels.get_pixel(x as u32, y as u32);
        if target == color {
            return 0;
        }

        // Explicitly non-recursive: a Vec stack of packed flat indices, plus
        // a bit-per-pixel visited mask (a byte per pixel would run to
        // hundreds of MB at the dimension clamp).
        let mut visited = vec![0u64; (w * h + 63) / 64];
        let mut stack: Vec<u32> = Vec::with_capacity(1024);
        visited[seed / 64] |= 1u64 << (seed % 64);
        stack.push(seed as u32);
        let mut filled = 0usize;

        while let Some(idx) = stack.pop() {
            if filled >= FLOOD_FILL_PIXEL_CAP {
                log::debug!("flood_fill: visited-pixel cap reached, truncating");
                break;
            }
            let i = idx as usize;
            let px = (i % w) as u32;
            let py = (i / w) as u32;
            self.pixels.put_pixel(px, py, color);
            filled += 1;

            // 4-connected neighbors
            if px > 0 {
                Self::push_if_match(&self.pixels, &mut visited, &mut stack, i - 1, target);
            }
            if (px as usize) + 1 < w {
                Self::push_if_match(&self.pixels, &mut visited, &mut stack, i + 1, target);
            }
            if py > 0 {
                Self::push_if_match(&self.pixels, &mut visited, &mut stack, i - w, target);
            }
            if (py as usize) + 1 < h {
                Self::push_if_match(&self.pixels, &mut visited, &mut stack, i + w, target);
            }
        }
        filled
    }

    #[inline(always)]
    fn push_if_match(
        pixels: &RgbaImage,
        visited: &mut [u64],
        stack: &mut Vec<u32>,
        idx: usize,
        target: Rgba<u8>,
    ) {
        let mask = 1u64 << (idx % 64);
        if visited[idx / 64] & mask != 0 {
            return;
        }
        let w = pixels.width() as usize;
        let px = (idx % w) as u32;
        let py = (idx / w) as u32;
        if *pixels.get_pixel(px, py) == target {
            visited[idx / 64] |= mask;
            stack.push(idx as u32);
        }
    }

    /// Invert RGB channels across the whole surface; alpha untouched.
    pub fn invert_colors(&mut self) {
        invert_image(&mut self.pixels);
    }

    /// FNV-1a digest of the raw pixel bytes. Used by modified-tracking to
    /// detect divergence from the last-saved state.
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for &b in self.pixels.as_raw() {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }
}

/// Per-pixel RGB inversion (255−R, 255−G, 255−B), alpha unchanged.
/// Shared by whole-surface inversion and detached selection content.
pub fn invert_image(img: &mut RgbaImage) {
    img.as_mut()
        .par_chunks_exact_mut(4)
        .for_each(|px| {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_preserves_content_top_left() {
        let mut s = Surface::new(4, 4, WHITE);
        s.put_pixel(1, 1, BLACK);
        s.resize(8, 8, Rgba([0, 255, 0, 255]));
        assert_eq!(s.pick_color(1, 1), Some(BLACK));
        assert_eq!(s.pick_color(7, 7), Some(Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn flood_fill_respects_boundary() {
        // 10×10 white canvas with a black frame at x/y == 2 and 7.
        let mut s = Surface::new(10, 10, WHITE);
        for i in 2..=7 {
            s.put_pixel(i, 2, BLACK);
            s.put_pixel(i, 7, BLACK);
            s.put_pixel(2, i, BLACK);
            s.put_pixel(7, i, BLACK);
        }
        let red = Rgba([255, 0, 0, 255]);
        let filled = s.flood_fill(4, 4, red);
        assert_eq!(filled, 16); // interior is 4×4
        assert_eq!(s.pick_color(3, 3), Some(red));
        assert_eq!(s.pick_color(2, 2), Some(BLACK));
        assert_eq!(s.pick_color(1, 1), Some(WHITE));
    }

    #[test]
    fn flood_fill_counts_each_pixel_once_around_an_obstacle() {
        // A partial wall splits the frontier in two; the halves reconverge
        // below it. Every white pixel must be filled exactly once.
        let mut s = Surface::new(7, 7, WHITE);
        for y in 0..5 {
            s.put_pixel(3, y, BLACK);
        }
        let red = Rgba([255, 0, 0, 255]);
        let filled = s.flood_fill(0, 0, red);
        assert_eq!(filled, 7 * 7 - 5);
        assert_eq!(s.pick_color(6, 0), Some(red));
        assert_eq!(s.pick_color(3, 2), Some(BLACK));
    }

    #[test]
    fn flood_fill_same_color_is_noop() {
        let mut s = Surface::new(8, 8, WHITE);
        let before = s.clone();
        assert_eq!(s.flood_fill(3, 3, WHITE), 0);
        assert!(s == before);
    }

    #[test]
    fn flood_fill_out_of_bounds_is_noop() {
        let mut s = Surface::new(8, 8, WHITE);
        assert_eq!(s.flood_fill(-1, 3, BLACK), 0);
        assert_eq!(s.flood_fill(3, 99, BLACK), 0);
    }

    #[test]
    fn invert_is_involutive() {
        let mut s = Surface::new(3, 3, Rgba([10, 200, 33, 255]));
        let before = s.clone();
        s.invert_colors();
        assert_eq!(s.pick_color(0, 0), Some(Rgba([245, 55, 222, 255])));
        s.invert_colors();
        assert!(s == before);
    }

    #[test]
    fn copy_region_pads_out_of_bounds_with_transparent() {
        let s = Surface::new(4, 4, BLACK);
        let img = s.copy_region(PixelRect::new(-2, 0, 4, 2));
        assert_eq!(*img.get_pixel(0, 0), TRANSPARENT);
        assert_eq!(*img.get_pixel(2, 0), BLACK);
    }
}
