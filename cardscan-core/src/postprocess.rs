use std::cmp::Ordering;

use crate::types::RectangleCandidate;

/// Ranking filters applied after suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankConfig {
    /// Minimum side as a fraction of `min(width, height)`.
    pub min_size_fraction: f64,
    /// Maximum side as a fraction of `max(width, height)`.
    pub max_size_fraction: f64,
    /// Smallest kept aspect ratio (inclusive).
    pub min_aspect_ratio: f64,
    /// Largest kept aspect ratio (inclusive).
    pub max_aspect_ratio: f64,
    /// The maximum number of rectangles returned.
    pub top_k: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            min_size_fraction: 0.05,
            max_size_fraction: 0.9,
            min_aspect_ratio: 0.4,
            max_aspect_ratio: 2.0,
            top_k: 10,
        }
    }
}

/// Suppress overlapping candidates in generation order.
///
/// Candidates are visited in the order given, not by confidence. A candidate
/// that overlaps no kept rectangle by more than `threshold` IoU is kept. One
/// that does overlap replaces the rectangles it overlaps only when its
/// confidence is strictly greater than each of theirs, taking the slot of the
/// earliest; otherwise it is dropped. Kept rectangles therefore never overlap
/// each other by more than `threshold`.
pub fn non_max_suppression(
    candidates: Vec<RectangleCandidate>,
    threshold: f64,
) -> Vec<RectangleCandidate> {
    let mut kept: Vec<RectangleCandidate> = Vec::new();
    let mut overlapping: Vec<usize> = Vec::new();
    for candidate in candidates {
        overlapping.clear();
        overlapping.extend(
            kept.iter()
                .enumerate()
                .filter(|(_, k)| candidate.bbox.iou(&k.bbox) > threshold)
                .map(|(idx, _)| idx),
        );

        let Some((&first, rest)) = overlapping.split_first() else {
            kept.push(candidate);
            continue;
        };
        let wins = overlapping
            .iter()
            .all(|&idx| candidate.confidence > kept[idx].confidence);
        if wins {
            for &idx in rest.iter().rev() {
                kept.remove(idx);
            }
            kept[first] = candidate;
        }
    }
    kept
}

/// Sort by confidence, drop implausible sizes and shapes, keep the top `k`.
///
/// The sort is stable, so equal confidences keep their suppression order.
pub fn rank_and_filter(
    mut candidates: Vec<RectangleCandidate>,
    image_width: u32,
    image_height: u32,
    config: &RankConfig,
) -> Vec<RectangleCandidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let min_side = config.min_size_fraction * f64::from(image_width.min(image_height));
    let max_side = config.max_size_fraction * f64::from(image_width.max(image_height));
    candidates.retain(|c| {
        let (w, h) = (f64::from(c.bbox.width), f64::from(c.bbox.height));
        let size_ok = w >= min_side && h >= min_side && w <= max_side && h <= max_side;
        let shape_ok =
            c.aspect_ratio >= config.min_aspect_ratio && c.aspect_ratio <= config.max_aspect_ratio;
        size_ok && shape_ok
    });
    candidates.truncate(config.top_k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn cand(x: u32, y: u32, w: u32, h: u32, confidence: f64) -> RectangleCandidate {
        RectangleCandidate::new(BoundingBox::new(x, y, w, h), confidence)
    }

    #[test]
    fn keeps_first_of_equal_overlapping_candidates() {
        let out = non_max_suppression(
            vec![cand(0, 0, 10, 10, 0.5), cand(1, 1, 10, 10, 0.5)],
            0.3,
        );
        assert_eq!(out, vec![cand(0, 0, 10, 10, 0.5)]);
    }

    #[test]
    fn later_stronger_candidate_replaces_in_place() {
        let out = non_max_suppression(
            vec![
                cand(0, 0, 10, 10, 0.4),
                cand(100, 100, 10, 10, 0.9),
                cand(1, 0, 10, 10, 0.6),
            ],
            0.3,
        );
        assert_eq!(out, vec![cand(1, 0, 10, 10, 0.6), cand(100, 100, 10, 10, 0.9)]);
    }

    #[test]
    fn processes_in_given_order_not_by_confidence() {
        // a and c each overlap b but not each other.
        let a = cand(0, 0, 10, 10, 0.9);
        let b = cand(4, 0, 10, 10, 0.8);
        let c = cand(8, 0, 10, 10, 0.7);
        // Sorted greedy suppression would keep a and c. Visiting c, b, a
        // lets b evict c and a then evict b.
        let out = non_max_suppression(vec![c.clone(), b.clone(), a.clone()], 0.3);
        assert_eq!(out, vec![a.clone()]);

        let out = non_max_suppression(vec![a.clone(), b, c.clone()], 0.3);
        assert_eq!(out, vec![a, c]);
    }

    #[test]
    fn candidate_must_beat_every_overlap_and_evicts_them() {
        let left = cand(0, 0, 10, 10, 0.5);
        let right = cand(10, 0, 10, 10, 0.7);
        let bridge = cand(4, 0, 12, 10, 0.6);
        let out = non_max_suppression(vec![left.clone(), right.clone(), bridge.clone()], 0.3);
        assert_eq!(out, vec![left.clone(), right.clone()]);

        let strong_bridge = cand(4, 0, 12, 10, 0.8);
        let out = non_max_suppression(vec![left, right, strong_bridge.clone()], 0.3);
        assert_eq!(out, vec![strong_bridge]);
    }

    #[test]
    fn suppressed_set_has_no_strong_overlaps() {
        let mut input = Vec::new();
        for i in 0..30u32 {
            input.push(cand(i * 3, (i * 7) % 20, 20, 28, f64::from((i * 13) % 17) / 17.0));
        }
        let out = non_max_suppression(input, 0.3);
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                assert!(a.bbox.iou(&b.bbox) <= 0.3);
            }
        }
    }

    #[test]
    fn ranking_sorts_filters_and_truncates() {
        let config = RankConfig {
            top_k: 2,
            ..RankConfig::default()
        };
        let out = rank_and_filter(
            vec![
                cand(0, 0, 50, 70, 0.4),
                cand(0, 0, 50, 70, 0.8),
                cand(0, 0, 4, 6, 0.99),    // too small: 0.05 * 200 = 10
                cand(0, 0, 100, 30, 0.95), // aspect 3.33
                cand(0, 0, 50, 70, 0.6),
            ],
            200,
            300,
            &config,
        );
        let confidences: Vec<f64> = out.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, vec![0.8, 0.6]);
    }

    #[test]
    fn ranking_rejects_oversized_and_keeps_boundary_values() {
        let config = RankConfig::default();
        let out = rank_and_filter(
            vec![
                cand(0, 0, 100, 271, 0.9), // 271 > 0.9 * 300 = 270
                cand(0, 0, 100, 250, 0.8), // aspect exactly 0.4
                cand(0, 0, 200, 100, 0.7), // aspect exactly 2.0
                cand(0, 0, 10, 10, 0.6),   // side exactly 0.05 * 200
            ],
            200,
            300,
            &config,
        );
        let confidences: Vec<f64> = out.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, vec![0.8, 0.7, 0.6]);
    }
}
