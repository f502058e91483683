//! Drawing detections and saving intermediate images.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cardscan_core::BoundingBox;
use cardscan_utils::config::AnnotationSettings;
use image::{GrayImage, RgbaImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

/// Outline every rectangle on `image`, `style.thickness` pixels wide, drawn
/// inward from the rectangle edge and clipped to the image.
pub fn draw_rectangles(image: &mut RgbaImage, boxes: &[BoundingBox], style: &AnnotationSettings) {
    let (img_w, img_h) = image.dimensions();
    if img_w == 0 || img_h == 0 {
        return;
    }
    let color = style.color.to_rgba();
    for bbox in boxes {
        for inset in 0..style.thickness.max(1) {
            if let Some(rect) = inset_rect(bbox, inset, img_w, img_h) {
                draw_hollow_rect_mut(image, rect, color);
            }
        }
    }
}

/// Shrink `bbox` by `inset` on every side and clamp it to the image.
fn inset_rect(bbox: &BoundingBox, inset: u32, img_w: u32, img_h: u32) -> Option<Rect> {
    let x1 = bbox.x.checked_add(inset)?;
    let y1 = bbox.y.checked_add(inset)?;
    let x2 = bbox.x.saturating_add(bbox.width).checked_sub(inset)?.min(img_w - 1);
    let y2 = bbox.y.saturating_add(bbox.height).checked_sub(inset)?.min(img_h - 1);
    if x1 > x2 || y1 > y2 {
        return None;
    }
    Some(Rect::at(x1 as i32, y1 as i32).of_size(x2 - x1 + 1, y2 - y1 + 1))
}

/// Save an annotated copy of `image` to `output_path`.
pub fn save_annotated(
    image: &RgbaImage,
    boxes: &[BoundingBox],
    style: &AnnotationSettings,
    output_path: &Path,
) -> Result<PathBuf> {
    let mut canvas = image.clone();
    draw_rectangles(&mut canvas, boxes, style);
    save_with_parent(output_path, |path| canvas.save(path))?;
    Ok(output_path.to_path_buf())
}

/// Save a binary edge map as a grayscale PNG.
pub fn save_edge_map(edges: &GrayImage, output_path: &Path) -> Result<PathBuf> {
    save_with_parent(output_path, |path| edges.save(path))?;
    Ok(output_path.to_path_buf())
}

fn save_with_parent(
    output_path: &Path,
    save: impl FnOnce(&Path) -> image::ImageResult<()>,
) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    save(output_path)
        .with_context(|| format!("failed to save image {}", output_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardscan_utils::RgbaColor;
    use image::Rgba;

    fn style(thickness: u32) -> AnnotationSettings {
        AnnotationSettings {
            color: RgbaColor::opaque(0, 255, 0),
            thickness,
        }
    }

    #[test]
    fn outline_is_drawn_inward_with_thickness() {
        let mut image = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        draw_rectangles(&mut image, &[BoundingBox::new(5, 5, 20, 20)], &style(2));
        let green = Rgba([0, 255, 0, 255]);
        assert_eq!(*image.get_pixel(5, 5), green);
        assert_eq!(*image.get_pixel(25, 25), green);
        assert_eq!(*image.get_pixel(6, 15), green);
        assert_eq!(*image.get_pixel(7, 15), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(4, 5), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rectangles_touching_the_border_are_clipped() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        draw_rectangles(&mut image, &[BoundingBox::new(2, 2, 50, 50)], &style(1));
        assert_eq!(*image.get_pixel(9, 5), Rgba([0, 255, 0, 255]));
        assert_eq!(*image.get_pixel(5, 9), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn thick_outline_on_small_box_stops_when_collapsed() {
        assert!(inset_rect(&BoundingBox::new(0, 0, 4, 4), 3, 10, 10).is_none());
        let mut image = RgbaImage::new(10, 10);
        draw_rectangles(&mut image, &[BoundingBox::new(0, 0, 4, 4)], &style(10));
        assert_eq!(*image.get_pixel(1, 2), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn saves_into_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out.png");
        let saved = save_edge_map(&GrayImage::new(3, 3), &path).expect("save");
        assert!(saved.exists());
    }
}
