//! Edge map construction: grayscale, box blur, Sobel threshold.
//!
//! Every intermediate is a single-channel [`GrayImage`]. The grayscale value
//! is what an RGB-replicated buffer would carry in each color channel, so the
//! single channel loses nothing and keeps memory at one byte per pixel.

use image::{GrayImage, Luma, RgbaImage};

/// Value written for edge pixels in the binary map.
pub const EDGE_ON: u8 = 255;

/// Rec. 601 luma, rounded half-to-even into a byte.
pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    let (w, h) = image.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        Luma([luma.round_ties_even().clamp(0.0, 255.0) as u8])
    })
}

/// Box radius used to approximate a Gaussian of the given sigma.
pub fn blur_radius(sigma: f64) -> u32 {
    if sigma.is_finite() && sigma > 0.0 {
        (sigma * 3.0).ceil() as u32
    } else {
        0
    }
}

/// Mean filter over a `(2r+1)^2` window.
///
/// Near the borders the window shrinks to its in-bounds part instead of
/// padding. The mean is computed separably from exact integer row sums, which
/// gives the same rounded value as averaging the 2D window directly. Images
/// smaller than the window are returned unchanged.
pub fn box_blur(gray: &GrayImage, radius: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let span = 2 * u64::from(radius) + 1;
    if radius == 0 || u64::from(w) < span || u64::from(h) < span {
        return gray.clone();
    }
    let (wu, hu, r) = (w as usize, h as usize, radius as usize);

    // Horizontal pass: sum of the in-bounds samples around each pixel.
    let mut row_sums = vec![0u32; wu * hu];
    let mut prefix = vec![0u32; wu + 1];
    for (y, row) in gray.as_raw().chunks_exact(wu).enumerate() {
        for (x, &v) in row.iter().enumerate() {
            prefix[x + 1] = prefix[x] + u32::from(v);
        }
        for x in 0..wu {
            let (lo, hi) = window(x, r, wu);
            row_sums[y * wu + x] = prefix[hi + 1] - prefix[lo];
        }
    }

    // Vertical pass over the row sums, divided by the full window count.
    let mut out = GrayImage::new(w, h);
    let mut col_prefix = vec![0u32; hu + 1];
    for x in 0..wu {
        let (xlo, xhi) = window(x, r, wu);
        let nx = (xhi - xlo + 1) as u32;
        for y in 0..hu {
            col_prefix[y + 1] = col_prefix[y] + row_sums[y * wu + x];
        }
        for y in 0..hu {
            let (ylo, yhi) = window(y, r, hu);
            let count = nx * (yhi - ylo + 1) as u32;
            let sum = col_prefix[yhi + 1] - col_prefix[ylo];
            let mean = f64::from(sum) / f64::from(count);
            out.put_pixel(x as u32, y as u32, Luma([mean.round_ties_even() as u8]));
        }
    }
    out
}

#[inline]
fn window(center: usize, radius: usize, len: usize) -> (usize, usize) {
    (center.saturating_sub(radius), (center + radius).min(len - 1))
}

/// Binary Sobel edge detection.
///
/// A pixel is set to [`EDGE_ON`] when `sqrt(gx^2 + gy^2)` is strictly greater
/// than `threshold`. The outermost ring is never evaluated and stays zero.
pub fn sobel_edges(blurred: &GrayImage, threshold: f64) -> GrayImage {
    let (w, h) = blurred.dimensions();
    let mut out = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    let px = |x: u32, y: u32| i32::from(blurred.get_pixel(x, y)[0]);
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p00 = px(x - 1, y - 1);
            let p10 = px(x, y - 1);
            let p20 = px(x + 1, y - 1);
            let p01 = px(x - 1, y);
            let p21 = px(x + 1, y);
            let p02 = px(x - 1, y + 1);
            let p12 = px(x, y + 1);
            let p22 = px(x + 1, y + 1);

            let gx = -p00 + p20 - 2 * p01 + 2 * p21 - p02 + p22;
            let gy = -p00 - 2 * p10 - p20 + p02 + 2 * p12 + p22;

            let magnitude = f64::from(gx * gx + gy * gy).sqrt();
            if magnitude > threshold {
                out.put_pixel(x, y, Luma([EDGE_ON]));
            }
        }
    }
    out
}

/// Binary edge map with per-row and per-column counts of bright pixels.
///
/// The prefix counts let a rectangle perimeter be scored in constant time
/// while counting exactly the samples a pixel-by-pixel walk would.
#[derive(Debug, Clone)]
pub struct EdgeMap {
    image: GrayImage,
    row_prefix: Vec<u32>,
    col_prefix: Vec<u32>,
}

impl EdgeMap {
    /// Index `image`, counting pixels whose value is strictly above `bright_threshold`.
    pub fn new(image: GrayImage, bright_threshold: u8) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let mut row_prefix = vec![0u32; h * (w + 1)];
        let mut col_prefix = vec![0u32; w * (h + 1)];
        for y in 0..h {
            for x in 0..w {
                let hit = u32::from(image.get_pixel(x as u32, y as u32)[0] > bright_threshold);
                row_prefix[y * (w + 1) + x + 1] = row_prefix[y * (w + 1) + x] + hit;
                col_prefix[x * (h + 1) + y + 1] = col_prefix[x * (h + 1) + y] + hit;
            }
        }
        Self {
            image,
            row_prefix,
            col_prefix,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The underlying binary image.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Number of bright pixels in row `y` over the inclusive span `x0..=x1`,
    /// along with how many of those positions are inside the image.
    pub fn row_hits(&self, y: u32, x0: u32, x1: u32) -> (u32, u32) {
        if y >= self.height() || x0 >= self.width() || x1 < x0 {
            return (0, 0);
        }
        let w = self.width() as usize;
        let hi = x1.min(self.width() - 1) as usize;
        let base = y as usize * (w + 1);
        let hits = self.row_prefix[base + hi + 1] - self.row_prefix[base + x0 as usize];
        (hits, (hi - x0 as usize + 1) as u32)
    }

    /// Column counterpart of [`EdgeMap::row_hits`] over `y0..=y1`.
    pub fn column_hits(&self, x: u32, y0: u32, y1: u32) -> (u32, u32) {
        if x >= self.width() || y0 >= self.height() || y1 < y0 {
            return (0, 0);
        }
        let h = self.height() as usize;
        let hi = y1.min(self.height() - 1) as usize;
        let base = x as usize * (h + 1);
        let hits = self.col_prefix[base + hi + 1] - self.col_prefix[base + y0 as usize];
        (hits, (hi - y0 as usize + 1) as u32)
    }
}
