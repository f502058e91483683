//! Source sharpening applied before edge extraction.

use image::{Rgba, RgbaImage};

/// 3x3 sharpening kernel applied to each color channel.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Sharpen the RGB channels of `image` with a 3x3 Laplacian-boosted kernel.
///
/// Interior pixels are convolved per channel and clamped to `0..=255` with
/// alpha forced opaque. The one-pixel border is copied through untouched, and
/// images smaller than the kernel are returned unchanged.
pub fn sharpen(image: &RgbaImage) -> RgbaImage {
    let (w, h) = image.dimensions();
    let mut out = image.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut px = [0u8, 0, 0, 255];
            for (c, channel) in px.iter_mut().enumerate().take(3) {
                let mut acc = 0i32;
                for (ky, krow) in SHARPEN_KERNEL.iter().enumerate() {
                    for (kx, &k) in krow.iter().enumerate() {
                        if k != 0 {
                            let sample = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                            acc += k * i32::from(sample[c]);
                        }
                    }
                }
                *channel = acc.clamp(0, 255) as u8;
            }
            out.put_pixel(x, y, Rgba(px));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_is_unchanged_in_color() {
        let img = RgbaImage::from_pixel(6, 5, Rgba([90, 120, 30, 255]));
        assert_eq!(sharpen(&img), img);
    }

    #[test]
    fn tiny_images_pass_through() {
        let img = RgbaImage::from_pixel(2, 9, Rgba([1, 2, 3, 4]));
        assert_eq!(sharpen(&img), img);
    }

    #[test]
    fn border_is_copied_and_interior_alpha_forced() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 10]));
        let out = sharpen(&img);
        assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100, 10]);
        assert_eq!(out.get_pixel(3, 2).0, [100, 100, 100, 10]);
        assert_eq!(out.get_pixel(1, 1).0, [100, 100, 100, 255]);
    }

    #[test]
    fn isolated_bright_pixel_is_boosted_and_neighbours_clamped() {
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([40, 40, 40, 255]));
        img.put_pixel(2, 2, Rgba([100, 40, 40, 255]));
        let out = sharpen(&img);
        // 5 * 100 - 4 * 40 = 340 -> clamped.
        assert_eq!(out.get_pixel(2, 2)[0], 255);
        // 5 * 40 - 100 - 3 * 40 = -20 -> clamped.
        assert_eq!(out.get_pixel(2, 1)[0], 0);
        // Untouched channel stays flat.
        assert_eq!(out.get_pixel(2, 2)[1], 40);
    }
}
