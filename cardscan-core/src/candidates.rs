//! Multi-scale sliding-window candidate generation and scoring.

use log::trace;
use rayon::prelude::*;

use crate::edges::EdgeMap;
use crate::types::{BoundingBox, RectangleCandidate};

/// Window sizes and stride derived from the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchGrid {
    /// Smallest window width: `min(0.1 * W, 100)`, floored, at least 1.
    pub min_width: u32,
    /// Smallest window height: `min(0.1 * H, 140)`, floored, at least 1.
    pub min_height: u32,
    /// Window widths must stay strictly below `0.8 * W`.
    pub max_width: f64,
    /// Window heights must stay strictly below `0.8 * H`.
    pub max_height: f64,
    /// Stride for positions and sizes: `max(10, min(W, H) / 50)`.
    pub step: u32,
}

impl SearchGrid {
    pub fn for_image(width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        Self {
            min_width: ((w * 0.1).min(100.0) as u32).max(1),
            min_height: ((h * 0.1).min(140.0) as u32).max(1),
            max_width: w * 0.8,
            max_height: h * 0.8,
            step: (width.min(height) / 50).max(10),
        }
    }

    /// Top edges visited by the outer loop, in order.
    pub fn row_origins(&self, height: u32) -> Vec<u32> {
        let end = height.saturating_sub(self.min_height);
        (0..end).step_by(self.step as usize).collect()
    }

    /// Left edges visited for each row, in order.
    pub fn column_origins(&self, width: u32) -> Vec<u32> {
        let end = width.saturating_sub(self.min_width);
        (0..end).step_by(self.step as usize).collect()
    }
}

/// Knobs for the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Candidates must score strictly above this.
    pub confidence_threshold: f64,
    /// Ratio rewarded by the aspect bonus.
    pub card_aspect_ratio: f64,
    /// Scan rows on the rayon pool.
    pub parallel: bool,
}

/// What the generator produced.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Accepted candidates in row-major `(y, x, w, h)` order.
    pub candidates: Vec<RectangleCandidate>,
    /// Number of windows scored.
    pub evaluated: u64,
    /// Set when the search stopped early because of cancellation.
    pub cancelled: bool,
}

/// Score a window by its perimeter edge density and aspect fit.
///
/// Every position on the four sides is sampled with inclusive spans
/// `x..=x+w` and `y..=y+h`, so each corner is counted twice. Only samples
/// inside the map count towards the denominator.
pub fn score_rectangle(edges: &EdgeMap, bbox: &BoundingBox, card_aspect_ratio: f64) -> f64 {
    let x1 = bbox.x.saturating_add(bbox.width);
    let y1 = bbox.y.saturating_add(bbox.height);
    let sides = [
        edges.row_hits(bbox.y, bbox.x, x1),
        edges.row_hits(y1, bbox.x, x1),
        edges.column_hits(bbox.x, bbox.y, y1),
        edges.column_hits(x1, bbox.y, y1),
    ];
    let (hits, samples) = sides
        .iter()
        .fold((0u64, 0u64), |(h, s), &(hit, n)| (h + u64::from(hit), s + u64::from(n)));

    let edge_ratio = if samples == 0 {
        0.0
    } else {
        hits as f64 / samples as f64
    };
    let aspect_bonus = 1.0 - (bbox.aspect_ratio() - card_aspect_ratio).abs() / card_aspect_ratio;
    0.7 * edge_ratio + 0.3 * aspect_bonus.max(0.0)
}

/// Enumerate and score every window of `grid` over `edges`.
///
/// The loop nest is `y, x, w, h`, each advancing by `grid.step`; a window is
/// kept when its score is strictly above the threshold. Rows may be scanned in
/// parallel, but their outputs are concatenated in row order so the result is
/// identical to a sequential scan. `cancelled` is polled once per row.
pub fn generate_candidates(
    edges: &EdgeMap,
    grid: &SearchGrid,
    params: &GenerationParams,
    cancelled: &(dyn Fn() -> bool + Sync),
) -> Generation {
    let rows = grid.row_origins(edges.height());
    let columns = grid.column_origins(edges.width());

    let scan = |&y: &u32| -> Option<(Vec<RectangleCandidate>, u64)> {
        if cancelled() {
            return None;
        }
        Some(scan_row(edges, grid, params, y, &columns))
    };
    let per_row: Vec<_> = if params.parallel {
        rows.par_iter().map(scan).collect()
    } else {
        rows.iter().map(scan).collect()
    };

    let mut generation = Generation::default();
    for row in per_row {
        match row {
            Some((mut found, evaluated)) => {
                generation.candidates.append(&mut found);
                generation.evaluated += evaluated;
            }
            None => generation.cancelled = true,
        }
    }
    generation
}

fn scan_row(
    edges: &EdgeMap,
    grid: &SearchGrid,
    params: &GenerationParams,
    y: u32,
    columns: &[u32],
) -> (Vec<RectangleCandidate>, u64) {
    let (img_w, img_h) = (edges.width(), edges.height());
    let step = grid.step as usize;
    let mut found = Vec::new();
    let mut evaluated = 0u64;

    for &x in columns {
        let widths = (grid.min_width..)
            .step_by(step)
            .take_while(|&w| f64::from(w) < grid.max_width && x + w < img_w);
        for w in widths {
            let heights = (grid.min_height..)
                .step_by(step)
                .take_while(|&h| f64::from(h) < grid.max_height && y + h < img_h);
            for h in heights {
                let bbox = BoundingBox::new(x, y, w, h);
                let confidence = score_rectangle(edges, &bbox, params.card_aspect_ratio);
                evaluated += 1;
                if confidence > params.confidence_threshold {
                    found.push(RectangleCandidate::new(bbox, confidence));
                }
            }
        }
    }
    trace!("row y={y}: {} of {evaluated} windows kept", found.len());
    (found, evaluated)
}
