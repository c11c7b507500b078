// ============================================================================
// PRINT PLACEMENT — centered, aspect-preserving page fit
// ============================================================================

use crate::canvas::PixelRect;

/// Compute where a `content_w`×`content_h` surface lands on `page`: scaled to
/// fit (never enlarged past the page), aspect ratio preserved, centered.
/// The shell hands this rect to whatever actually prints.
pub fn fit_to_page(content_w: u32, content_h: u32, page: PixelRect) -> PixelRect {
    if content_w == 0 || content_h == 0 || page.is_empty() {
        return PixelRect::new(page.x, page.y, 0, 0);
    }
    let sx = page.w as f64 / content_w as f64;
    let sy = page.h as f64 / content_h as f64;
    let s = sx.min(sy);
    let w = ((content_w as f64 * s).round() as u32).clamp(1, page.w);
    let h = ((content_h as f64 * s).round() as u32).clamp(1, page.h);
    PixelRect::new(
        page.x + (page.w as i32 - w as i32) / 2,
        page.y + (page.h as i32 - h as i32) / 2,
        w,
        h,
    )
}
