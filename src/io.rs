// ============================================================================
// IMAGE FILE I/O — load/save via the `image` crate
// ============================================================================

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not decode {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
    #[error("could not encode {path}: {source}")]
    Encode {
        path: String,
        source: image::ImageError,
    },
    #[error("unsupported save format: {0} (use png, jpg or bmp)")]
    UnsupportedFormat(String),
}

/// Decode a raster file (PNG/JPEG/BMP/GIF/TIFF/ICO per crate features) into
/// an RGBA buffer. On failure the caller's in-memory surface stays intact —
/// load is a pure read.
pub fn load_image(path: &Path) -> Result<RgbaImage, FileError> {
    let img = image::open(path).map_err(|source| FileError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("loaded {} ({}×{})", path.display(), img.width(), img.height());
    Ok(img.to_rgba8())
}

/// Encode the buffer to PNG, JPEG or BMP, chosen by the path's extension.
/// JPEG cannot carry alpha, so it flattens to RGB first.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<(), FileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let result = match ext.as_str() {
        "png" | "bmp" => img.save(path),
        "jpg" | "jpeg" => DynamicImage::ImageRgba8(img.clone()).to_rgb8().save(path),
        other => return Err(FileError::UnsupportedFormat(other.to_string())),
    };
    result.map_err(|source| FileError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("saved {}", path.display());
    Ok(())
}
