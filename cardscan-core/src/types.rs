//! Geometry and result types produced by the detector.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The x-coordinate of the top-left corner.
    pub x: u32,
    /// The y-coordinate of the top-left corner.
    pub y: u32,
    /// The width of the box.
    pub width: u32,
    /// The height of the box.
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Calculates the area of the bounding box.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Width divided by height, or `0.0` for a zero-height box.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            f64::from(self.width) / f64::from(self.height)
        }
    }

    /// Calculates the Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &Self) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }
        let intersection = u64::from(x2 - x1) * u64::from(y2 - y1);
        let union = self.area() + other.area() - intersection;
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }

    /// Corners in `[top-left, top-right, bottom-right, bottom-left]` order.
    pub fn corners(&self) -> [Corner; 4] {
        let (right, bottom) = (self.right(), self.bottom());
        [
            Corner::new(self.x, self.y),
            Corner::new(right, self.y),
            Corner::new(right, bottom),
            Corner::new(self.x, bottom),
        ]
    }

    /// Returns `true` when the box lies entirely inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }

    fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }
}

/// A rectangle corner in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
}

impl Corner {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A scored rectangular region that may contain a single card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangleCandidate {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    /// Score in `[0, 1]` combining perimeter edge density and aspect fit.
    pub confidence: f64,
    /// `width / height` of `bbox`.
    pub aspect_ratio: f64,
    /// `[TL, TR, BR, BL]` corners of `bbox`.
    pub corners: [Corner; 4],
}

impl RectangleCandidate {
    /// Build a candidate, deriving the aspect ratio and corners from `bbox`.
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            bbox,
            confidence,
            aspect_ratio: bbox.aspect_ratio(),
            corners: bbox.corners(),
        }
    }
}

/// Output of one detector run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// At most `top_k` rectangles, sorted by confidence (descending).
    pub rectangles: Vec<RectangleCandidate>,
    /// Human-readable stage completion messages, in pipeline order.
    pub debug_trace: Vec<String>,
}

impl DetectionResult {
    /// Returns `true` when no rectangle survived.
    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    /// The highest-confidence rectangle, if any.
    pub fn best(&self) -> Option<&RectangleCandidate> {
        self.rectangles.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BoundingBox::new(10, 10, 20, 30);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn iou_of_disjoint_or_touching_boxes_is_zero() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert_eq!(a.iou(&BoundingBox::new(20, 20, 5, 5)), 0.0);
        assert_eq!(a.iou(&BoundingBox::new(10, 0, 10, 10)), 0.0);
    }

    #[test]
    fn iou_of_partial_overlap() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 0, 10, 10);
        // 50 / (100 + 100 - 50)
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn degenerate_boxes_have_no_overlap_or_ratio() {
        let flat = BoundingBox::new(3, 3, 10, 0);
        assert_eq!(flat.aspect_ratio(), 0.0);
        assert_eq!(flat.iou(&flat), 0.0);
    }

    #[test]
    fn corners_follow_clockwise_order_from_top_left() {
        let corners = BoundingBox::new(2, 4, 6, 8).corners();
        assert_eq!(
            corners,
            [
                Corner::new(2, 4),
                Corner::new(8, 4),
                Corner::new(8, 12),
                Corner::new(2, 12),
            ]
        );
    }

    #[test]
    fn fits_within_checks_far_edges() {
        let b = BoundingBox::new(90, 40, 10, 10);
        assert!(b.fits_within(100, 50));
        assert!(!b.fits_within(99, 50));
        assert!(!b.fits_within(100, 49));
    }

    #[test]
    fn candidate_serializes_flat_record() {
        let candidate = RectangleCandidate::new(BoundingBox::new(1, 2, 25, 35), 0.5);
        let json = serde_json::to_value(&candidate).expect("serialize");
        assert_eq!(json["x"], 1);
        assert_eq!(json["height"], 35);
        assert_eq!(json["corners"][2]["x"], 26);
        assert!((json["aspect_ratio"].as_f64().unwrap() - 25.0 / 35.0).abs() < 1e-12);
    }
}
