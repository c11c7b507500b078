// ============================================================================
// TRANSFORM OPERATIONS — scale, rotate, flip, skew
// ============================================================================
//
// All functions are pure image-to-image; the editor decides whether a
// transform targets the whole surface or a detached selection's content, and
// which fill color newly exposed area gets (rotate exposes the background
// color on the whole image, skew exposes white, selection content always
// exposes transparent).

use image::{imageops, Rgba, RgbaImage};

/// Axis for mirror operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Stretch content to exactly `new_w`×`new_h` with smooth (bilinear)
/// resampling. Distinct from canvas resize, which never scales content.
pub fn scale_image(img: &RgbaImage, new_w: u32, new_h: u32) -> RgbaImage {
    let new_w = new_w.max(1);
    let new_h = new_h.max(1);
    imageops::resize(img, new_w, new_h, imageops::FilterType::Triangle)
}

pub fn flip_image(img: &RgbaImage, axis: FlipAxis) -> RgbaImage {
    match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(img),
        FlipAxis::Vertical => imageops::flip_vertical(img),
    }
}

/// Rotate about the image center by `angle_deg` (clockwise, screen coords).
/// The output bounding box is recomputed from the rotation; area not covered
/// by the source is filled with `fill`.
pub fn rotate_image(img: &RgbaImage, angle_deg: f32, fill: Rgba<u8>) -> RgbaImage {
    let rad = angle_deg.to_radians();
    let (sin, cos) = rad.sin_cos();
    let w = img.width() as f32;
    let h = img.height() as f32;

    // Round, not ceil: f32 trig of right angles leaves ~1e-7 residue that
    // must not grow the box by a pixel.
    let new_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let new_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;

    let src_cx = w * 0.5;
    let src_cy = h * 0.5;
    let dst_cx = new_w as f32 * 0.5;
    let dst_cy = new_h as f32 * 0.5;

    let mut out = RgbaImage::from_pixel(new_w, new_h, fill);
    // Inverse mapping: rotate each destination pixel back into source space.
    for y in 0..new_h {
        for x in 0..new_w {
            let dx = x as f32 + 0.5 - dst_cx;
            let dy = y as f32 + 0.5 - dst_cy;
            let sx = dx * cos + dy * sin + src_cx;
            let sy = -dx * sin + dy * cos + src_cy;
            let sxi = sx.floor() as i32;
            let syi = sy.floor() as i32;
            if sxi >= 0 && syi >= 0 && (sxi as u32) < img.width() && (syi as u32) < img.height() {
                out.put_pixel(x, y, *img.get_pixel(sxi as u32, syi as u32));
            }
        }
    }
    out
}

/// Shear by `h_deg` (horizontal) and `v_deg` (vertical). The output bounding
/// box covers the sheared quad; uncovered area is filled with `fill`.
///
/// Angles near ±90° would blow the bounds up without adding information, so
/// they are clamped to ±89°.
pub fn skew_image(img: &RgbaImage, h_deg: f32, v_deg: f32, fill: Rgba<u8>) -> RgbaImage {
    let th = h_deg.clamp(-89.0, 89.0).to_radians().tan();
    let tv = v_deg.clamp(-89.0, 89.0).to_radians().tan();
    if th == 0.0 && tv == 0.0 {
        return img.clone();
    }
    let w = img.width() as f32;
    let h = img.height() as f32;

    // Forward transform of the four corners gives the output bounds.
    let corners = [
        (0.0, 0.0),
        (w, 0.0),
        (0.0, h),
        (w, h),
    ];
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for (x, y) in corners {
        let tx = x + th * y;
        let ty = y + tv * x;
        min_x = min_x.min(tx);
        min_y = min_y.min(ty);
        max_x = max_x.max(tx);
        max_y = max_y.max(ty);
    }
    let new_w = (max_x - min_x).ceil().max(1.0) as u32;
    let new_h = (max_y - min_y).ceil().max(1.0) as u32;

    let det = 1.0 - th * tv;
    if det.abs() < 1e-6 {
        log::warn!("skew_image: degenerate shear ({h_deg}°, {v_deg}°), returning copy");
        return img.clone();
    }

    let mut out = RgbaImage::from_pixel(new_w, new_h, fill);
    for y in 0..new_h {
        for x in 0..new_w {
            let tx = x as f32 + 0.5 + min_x;
            let ty = y as f32 + 0.5 + min_y;
            // Inverse of [[1, th], [tv, 1]].
            let sx = (tx - th * ty) / det;
            let sy = (ty - tv * tx) / det;
            let sxi = sx.floor() as i32;
            let syi = sy.floor() as i32;
            if sxi >= 0 && syi >= 0 && (sxi as u32) < img.width() && (syi as u32) < img.height() {
                out.put_pixel(x, y, *img.get_pixel(sxi as u32, syi as u32));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};

    #[test]
    fn scale_hits_exact_dimensions() {
        let img = RgbaImage::from_pixel(10, 20, BLACK.into());
        let out = scale_image(&img, 33, 7);
        assert_eq!((out.width(), out.height()), (33, 7));
    }

    #[test]
    fn rotate_90_swaps_dimensions() {
        let img = RgbaImage::from_pixel(10, 4, BLACK.into());
        let out = rotate_image(&img, 90.0, WHITE.into());
        assert_eq!((out.width(), out.height()), (4, 10));
    }

    #[test]
    fn rotate_45_exposes_fill_in_corners() {
        let img = RgbaImage::from_pixel(10, 10, BLACK.into());
        let out = rotate_image(&img, 45.0, WHITE.into());
        // Diagonal grows the bbox; the very corner is outside the rotated square.
        assert_eq!(*out.get_pixel(0, 0), WHITE.into());
        let (cx, cy) = (out.width() / 2, out.height() / 2);
        assert_eq!(*out.get_pixel(cx, cy), BLACK.into());
    }

    #[test]
    fn flip_horizontal_mirrors_content() {
        let mut img = RgbaImage::from_pixel(4, 1, WHITE.into());
        img.put_pixel(0, 0, BLACK.into());
        let out = flip_image(&img, FlipAxis::Horizontal);
        assert_eq!(*out.get_pixel(3, 0), BLACK.into());
        assert_eq!(*out.get_pixel(0, 0), WHITE.into());
    }

    #[test]
    fn skew_grows_bounds_and_fills_exposed_area() {
        let img = RgbaImage::from_pixel(10, 10, BLACK.into());
        let out = skew_image(&img, 45.0, 0.0, WHITE.into());
        assert!(out.width() > 10);
        assert_eq!(out.height(), 10);
        // Top-right corner is exposed by the rightward shear of lower rows.
        assert_eq!(*out.get_pixel(out.width() - 1, 0), WHITE.into());
    }

    #[test]
    fn zero_skew_is_identity() {
        let mut img = RgbaImage::from_pixel(5, 5, WHITE.into());
        img.put_pixel(2, 3, BLACK.into());
        let out = skew_image(&img, 0.0, 0.0, WHITE.into());
        assert_eq!(out, img);
    }
}
