use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};

/// Load an image from disk into memory.
///
/// # Arguments
///
/// * `path` - The path to the image file.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path_ref = path.as_ref();
    image::open(path_ref).with_context(|| format!("failed to open image {}", path_ref.display()))
}

/// Load an image from disk and convert it into the RGBA8 layout the detector consumes.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    Ok(load_image(path)?.into_rgba8())
}

/// Returns `true` when `path` carries an extension the CLI treats as an image.
pub fn has_image_extension(path: &Path) -> bool {
    const EXTS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
