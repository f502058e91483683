//! Synthetic scene builders for tests, benches and demos.
//!
//! Scenes are solid backgrounds with axis-aligned rectangles drawn either as
//! outlines of a given stroke or as filled blocks. They stand in for binary
//! fixtures so every test image is reproducible from code.

use image::{Rgba, RgbaImage};

/// Incrementally draws rectangles onto a solid background.
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    canvas: RgbaImage,
}

impl SceneBuilder {
    /// Start a scene of `width` x `height` filled with `background`.
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Self {
        let [r, g, b] = background;
        Self {
            canvas: RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])),
        }
    }

    /// Start a black scene.
    pub fn black(width: u32, height: u32) -> Self {
        Self::new(width, height, [0, 0, 0])
    }

    /// Draw the outline of a rectangle. The stroke lies inside the rectangle
    /// bounds; pixels falling outside the canvas are clipped.
    pub fn outline(mut self, x: u32, y: u32, width: u32, height: u32, stroke: u32, color: [u8; 3]) -> Self {
        let stroke = stroke.max(1);
        let x_end = x.saturating_add(width);
        let y_end = y.saturating_add(height);
        for py in y..y_end {
            for px in x..x_end {
                let on_stroke = px < x + stroke
                    || px + stroke >= x_end
                    || py < y + stroke
                    || py + stroke >= y_end;
                if on_stroke {
                    self.put(px, py, color);
                }
            }
        }
        self
    }

    /// Fill a rectangle, clipped to the canvas.
    pub fn filled(mut self, x: u32, y: u32, width: u32, height: u32, color: [u8; 3]) -> Self {
        for py in y..y.saturating_add(height) {
            for px in x..x.saturating_add(width) {
                self.put(px, py, color);
            }
        }
        self
    }

    /// Finish the scene.
    pub fn build(self) -> RgbaImage {
        self.canvas
    }

    fn put(&mut self, x: u32, y: u32, [r, g, b]: [u8; 3]) {
        if x < self.canvas.width() && y < self.canvas.height() {
            self.canvas.put_pixel(x, y, Rgba([r, g, b, 255]));
        }
    }
}

/// A black scene with white card outlines of the given stroke.
pub fn outlined_cards(width: u32, height: u32, cards: &[(u32, u32, u32, u32)], stroke: u32) -> RgbaImage {
    cards
        .iter()
        .fold(SceneBuilder::black(width, height), |scene, &(x, y, w, h)| {
            scene.outline(x, y, w, h, stroke, [255, 255, 255])
        })
        .build()
}
