//! Serializable output records for the cardscan CLI.

use cardscan_core::{DetectionResult, RectangleCandidate};
use serde::Serialize;

/// A single detected rectangle as written to JSON.
#[derive(Debug, Serialize)]
pub struct RectangleRecord {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
    pub aspect_ratio: f64,
    /// Corners as `[x, y]` pairs: top-left, top-right, bottom-right, bottom-left.
    pub corners: [[u32; 2]; 4],
}

/// All detections for a single image.
#[derive(Debug, Serialize)]
pub struct ImageDetections {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub rectangles: Vec<RectangleRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_map: Option<String>,
}

impl ImageDetections {
    pub fn new(image: String, width: u32, height: u32, result: &DetectionResult, with_trace: bool) -> Self {
        Self {
            image,
            width,
            height,
            rectangles: result.rectangles.iter().map(RectangleRecord::from).collect(),
            trace: with_trace.then(|| result.debug_trace.clone()),
            annotated: None,
            edge_map: None,
        }
    }
}

impl From<&RectangleCandidate> for RectangleRecord {
    fn from(candidate: &RectangleCandidate) -> Self {
        Self {
            x: candidate.bbox.x,
            y: candidate.bbox.y,
            width: candidate.bbox.width,
            height: candidate.bbox.height,
            confidence: candidate.confidence,
            aspect_ratio: candidate.aspect_ratio,
            corners: candidate.corners.map(|c| [c.x, c.y]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardscan_core::BoundingBox;

    #[test]
    fn record_serializes_flat_fields_and_corners() {
        let candidate = RectangleCandidate::new(BoundingBox::new(10, 20, 50, 70), 0.75);
        let json = serde_json::to_value(RectangleRecord::from(&candidate)).expect("serialize");
        assert_eq!(json["x"], 10);
        assert_eq!(json["height"], 70);
        assert_eq!(json["confidence"], 0.75);
        assert_eq!(json["corners"][2], serde_json::json!([60, 90]));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let record = ImageDetections::new("a.png".into(), 4, 3, &DetectionResult::default(), false);
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["width"], 4);
        assert!(json.get("trace").is_none());
        assert!(json.get("annotated").is_none());
        assert!(json.get("edge_map").is_none());

        let traced = ImageDetections::new("a.png".into(), 4, 3, &DetectionResult::default(), true);
        assert_eq!(serde_json::to_value(&traced).expect("serialize")["trace"], serde_json::json!([]));
    }
}
