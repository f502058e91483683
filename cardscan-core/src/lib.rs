//! Edge-based trading card detection.
//!
//! The pipeline sharpens the input, builds a binary Sobel edge map from a
//! blurred grayscale copy, scores sliding windows by how much of their
//! perimeter lies on edges, suppresses overlaps, and returns the best
//! card-shaped rectangles.

/// Sliding-window candidate generation and scoring.
pub mod candidates;
/// High-level detector runner.
pub mod detector;
/// Grayscale, blur and Sobel edge map construction.
pub mod edges;
/// Stage callbacks, edge-map capture and cancellation.
pub mod observer;
/// Non-maximum suppression and final ranking.
pub mod postprocess;
/// Input sharpening.
pub mod preprocess;
/// Bounding boxes, candidates and results.
pub mod types;

pub use candidates::{Generation, GenerationParams, SearchGrid, generate_candidates, score_rectangle};
pub use detector::{CardDetector, DetectError, DetectorConfig, detect};
pub use edges::{EdgeMap, blur_radius, box_blur, sobel_edges, to_grayscale};
pub use observer::{DetectionObserver, NoopObserver, Stage, TraceRecorder};
pub use postprocess::{RankConfig, non_max_suppression, rank_and_filter};
pub use preprocess::sharpen;
pub use types::{BoundingBox, Corner, DetectionResult, RectangleCandidate};

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
