// ============================================================================
// CLIPBOARD OPERATIONS — copy/cut/paste with a shape-descriptor side-channel
// ============================================================================

use std::borrow::Cow;
use std::sync::Mutex;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::canvas::PixelRect;
use crate::components::selection::{polygon_bounds, FreeformSelection, RectSelection};

// ---------------------------------------------------------------------------
//  Payload
// ---------------------------------------------------------------------------

/// Shape metadata serialized next to the pixel data so a paste in another
/// instance can reconstruct the same selection kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeDescriptor {
    /// Rectangular selection: `[x, y, w, h]` at copy time.
    Rect { rect: [i32; 4] },
    /// Free-form selection: polygon path, original (pre-drag) vertices and
    /// the drag offset at copy time.
    Crop {
        points: Vec<[i32; 2]>,
        original_points: Vec<[i32; 2]>,
        offset: [i32; 2],
    },
}

/// Pixel image plus the optional descriptor, as carried across instances.
/// The descriptor travels as raw JSON: a foreign or corrupt producer must
/// degrade to a plain-image paste, never fail the operation.
#[derive(Clone)]
pub struct ClipboardPayload {
    pub image: RgbaImage,
    pub descriptor: Option<String>,
}

impl ClipboardPayload {
    pub fn plain(image: RgbaImage) -> Self {
        Self { image, descriptor: None }
    }
}

/// Serialize a rectangular selection (content must be captured).
pub fn payload_from_rect(sel: &RectSelection) -> Option<ClipboardPayload> {
    let content = sel.content.as_ref()?;
    let desc = ShapeDescriptor::Rect {
        rect: [sel.rect.x, sel.rect.y, sel.rect.w as i32, sel.rect.h as i32],
    };
    Some(ClipboardPayload {
        image: content.clone(),
        descriptor: serde_json::to_string(&desc).ok(),
    })
}

/// Serialize a free-form selection (content must be captured).
pub fn payload_from_freeform(sel: &FreeformSelection) -> Option<ClipboardPayload> {
    let content = sel.content.as_ref()?;
    let translated: Vec<[i32; 2]> = sel
        .points
        .iter()
        .map(|&(x, y)| [x + sel.offset.0, y + sel.offset.1])
        .collect();
    let desc = ShapeDescriptor::Crop {
        points: translated,
        original_points: sel.points.iter().map(|&(x, y)| [x, y]).collect(),
        offset: [sel.offset.0, sel.offset.1],
    };
    Some(ClipboardPayload {
        image: content.clone(),
        descriptor: serde_json::to_string(&desc).ok(),
    })
}

// ---------------------------------------------------------------------------
//  Paste reconstruction
// ---------------------------------------------------------------------------

/// A selection reconstructed by paste, already live (as if just captured).
pub enum PastedSelection {
    Rect(RectSelection),
    Freeform(FreeformSelection),
}

/// Build the pasted selection, recentered on a `canvas_w`×`canvas_h` canvas.
///
/// A parsable descriptor reproduces the matching selection kind; a missing or
/// malformed one falls back to a plain rectangular selection around the image.
pub fn build_paste(payload: &ClipboardPayload, canvas_w: u32, canvas_h: u32) -> PastedSelection {
    let img = &payload.image;
    let cx = canvas_w as i32 / 2 - img.width() as i32 / 2;
    let cy = canvas_h as i32 / 2 - img.height() as i32 / 2;

    let descriptor = payload.descriptor.as_deref().and_then(|json| {
        match serde_json::from_str::<ShapeDescriptor>(json) {
            Ok(d) => Some(d),
            Err(e) => {
                log::warn!("clipboard: unparsable shape descriptor ({e}), plain paste");
                None
            }
        }
    });

    match descriptor {
        Some(ShapeDescriptor::Crop { points, .. }) if points.len() >= 3 => {
            let pts: Vec<(i32, i32)> = points.iter().map(|p| (p[0], p[1])).collect();
            let bounds = polygon_bounds(&pts);
            // Translate the polygon so its bounding box lands centered.
            let dx = cx - bounds.x;
            let dy = cy - bounds.y;
            let recentered: Vec<(i32, i32)> =
                pts.iter().map(|&(x, y)| (x + dx, y + dy)).collect();
            let bounds = PixelRect::new(cx, cy, img.width(), img.height());
            PastedSelection::Freeform(FreeformSelection::from_content(
                recentered,
                bounds,
                img.clone(),
            ))
        }
        // A rect descriptor (or a degenerate crop) pastes as a rectangle;
        // the stored geometry only matters for the selection kind, position
        // is always recentered.
        _ => PastedSelection::Rect(RectSelection::from_content(cx, cy, img.clone())),
    }
}

// ---------------------------------------------------------------------------
//  In-process slot + OS clipboard bridge
// ---------------------------------------------------------------------------
// The OS clipboard carries the raw image; the descriptor side-channel lives
// in an in-process slot keyed by nothing (last copy wins), mirroring how the
// application-level clipboard retains what the OS image format drops.

static APP_CLIPBOARD: Mutex<Option<ClipboardPayload>> = Mutex::new(None);

/// Store a payload in the app clipboard and mirror the image to the OS.
pub fn set_clipboard(payload: ClipboardPayload) {
    copy_image_to_system(&payload.image);
    *APP_CLIPBOARD.lock().unwrap_or_else(|e| e.into_inner()) = Some(payload);
}

/// Current payload: the in-process slot first (it still has the descriptor),
/// else whatever image the OS clipboard holds.
pub fn get_clipboard() -> Option<ClipboardPayload> {
    if let Some(p) = APP_CLIPBOARD.lock().unwrap_or_else(|e| e.into_inner()).clone() {
        return Some(p);
    }
    get_image_from_system().map(ClipboardPayload::plain)
}

pub fn has_clipboard() -> bool {
    APP_CLIPBOARD
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .is_some()
}

fn copy_image_to_system(img: &RgbaImage) {
    // arboard wants ImageData { width, height, bytes } in RGBA order.
    match arboard::Clipboard::new() {
        Ok(mut clip) => {
            let data = arboard::ImageData {
                width: img.width() as usize,
                height: img.height() as usize,
                bytes: Cow::Borrowed(img.as_raw()),
            };
            if let Err(e) = clip.set_image(data) {
                log::warn!("clipboard: OS image write failed: {e}");
            }
        }
        Err(e) => log::warn!("clipboard: unavailable: {e}"),
    }
}

fn get_image_from_system() -> Option<RgbaImage> {
    let mut clip = arboard::Clipboard::new().ok()?;
    let data = clip.get_image().ok()?;
    RgbaImage::from_raw(data.width as u32, data.height as u32, data.bytes.into_owned())
}
