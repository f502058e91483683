//! Injectable diagnostics for detector runs.
//!
//! The detector never logs trace strings into global state on its own behalf;
//! callers that want stage messages, the intermediate edge map, or the ability
//! to stop a long search pass a [`DetectionObserver`].

use std::sync::atomic::{AtomicBool, Ordering};

use image::GrayImage;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Preprocess,
    Grayscale,
    Blur,
    EdgeThreshold,
    Generate,
    Suppress,
    Rank,
    Truncate,
}

impl Stage {
    /// Short lowercase label, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Preprocess => "preprocess",
            Stage::Grayscale => "grayscale",
            Stage::Blur => "blur",
            Stage::EdgeThreshold => "edge_threshold",
            Stage::Generate => "generate",
            Stage::Suppress => "suppress",
            Stage::Rank => "rank",
            Stage::Truncate => "truncate",
        }
    }
}

/// Receives stage notifications from a detector run.
///
/// All methods have no-op defaults. `is_cancelled` is polled from worker
/// threads while candidates are generated, hence the `Sync` bound.
pub trait DetectionObserver: Sync {
    /// Called once after each stage completes.
    fn on_stage(&mut self, _stage: Stage, _message: &str) {}

    /// Called with the binary edge map before candidate generation.
    fn on_edge_map(&mut self, _edges: &GrayImage) {}

    /// Returning `true` stops the sliding-window search at the next row.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DetectionObserver for NoopObserver {}

/// Observer that records stage messages and optionally the edge map.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    pub stages: Vec<(Stage, String)>,
    pub edge_map: Option<GrayImage>,
    capture_edge_map: bool,
    cancel: AtomicBool,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also keep a copy of the edge map.
    pub fn with_edge_map() -> Self {
        Self {
            capture_edge_map: true,
            ..Self::default()
        }
    }

    /// Request cancellation of the run this recorder observes.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Stages seen so far, in order.
    pub fn stage_order(&self) -> Vec<Stage> {
        self.stages.iter().map(|(stage, _)| *stage).collect()
    }
}

impl DetectionObserver for TraceRecorder {
    fn on_stage(&mut self, stage: Stage, message: &str) {
        self.stages.push((stage, message.to_string()));
    }

    fn on_edge_map(&mut self, edges: &GrayImage) {
        if self.capture_edge_map {
            self.edge_map = Some(edges.clone());
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}
