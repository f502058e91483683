//! Input collection.

use std::path::{Path, PathBuf};

use anyhow::Result;
use cardscan_utils::has_image_extension;
use log::debug;
use walkdir::WalkDir;

/// Collect all image paths from a file or directory, sorted.
pub fn collect_images(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!(
            "input path is neither file nor directory: {}",
            path.display()
        );
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        if has_image_extension(entry.path()) {
            images.push(entry.path().to_path_buf());
        } else {
            debug!("Skipping non-image file {}", entry.path().display());
        }
    }
    images.sort();
    Ok(images)
}

/// Output file name for an image, prefixed with its path relative to `root`
/// so images with the same name in different subdirectories do not collide.
pub fn output_name(image_path: &Path, root: &Path, suffix: &str, extension: &str) -> PathBuf {
    let relative = image_path.strip_prefix(root).unwrap_or(image_path);
    let stem: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|part| !part.is_empty() && part != "/")
        .collect();
    let stem = if stem.is_empty() {
        "image".to_string()
    } else {
        stem.join("_")
    };
    PathBuf::from(format!("{stem}{suffix}.{extension}"))
}
