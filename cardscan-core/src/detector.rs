use image::{DynamicImage, RgbaImage};
use log::{Level, debug};
use thiserror::Error;

use cardscan_utils::{config::DetectionSettings, timing_guard};

use crate::candidates::{GenerationParams, SearchGrid, generate_candidates};
use crate::edges::{EdgeMap, blur_radius, box_blur, sobel_edges, to_grayscale};
use crate::observer::{DetectionObserver, NoopObserver, Stage};
use crate::postprocess::{RankConfig, non_max_suppression, rank_and_filter};
use crate::preprocess::sharpen;
use crate::types::DetectionResult;

/// Errors raised when a raw pixel buffer does not describe an image.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    #[error("pixel buffer holds {actual} bytes but a {width}x{height} RGBA image needs {expected}")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Detector thresholds. The defaults are the calibrated constants.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Candidates must score strictly above this.
    pub confidence_threshold: f64,
    /// IoU above which candidates are treated as duplicates.
    pub nms_threshold: f64,
    /// Sobel magnitude a pixel must exceed to become an edge.
    pub gradient_threshold: f64,
    /// Edge-map value a perimeter sample must exceed to count.
    pub edge_value_threshold: u8,
    /// Sigma approximated by the box blur.
    pub blur_sigma: f64,
    /// Ratio rewarded by the aspect bonus.
    pub card_aspect_ratio: f64,
    /// Size, shape and count filters applied last.
    pub rank: RankConfig,
    /// Scan sliding-window rows on the rayon pool.
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectionSettings::default().into()
    }
}

impl From<DetectionSettings> for DetectorConfig {
    fn from(settings: DetectionSettings) -> Self {
        (&settings).into()
    }
}

impl From<&DetectionSettings> for DetectorConfig {
    fn from(settings: &DetectionSettings) -> Self {
        DetectorConfig {
            confidence_threshold: settings.confidence_threshold,
            nms_threshold: settings.nms_threshold,
            gradient_threshold: settings.gradient_threshold,
            edge_value_threshold: settings.edge_value_threshold,
            blur_sigma: settings.blur_sigma,
            card_aspect_ratio: settings.card_aspect_ratio,
            rank: RankConfig {
                min_size_fraction: settings.min_size_fraction,
                max_size_fraction: settings.max_size_fraction,
                min_aspect_ratio: settings.min_aspect_ratio,
                max_aspect_ratio: settings.max_aspect_ratio,
                top_k: settings.top_k,
            },
            parallel: settings.parallel,
        }
    }
}

/// Finds card-shaped rectangles in photographs.
///
/// Each call is independent: buffers are allocated per run and nothing is
/// shared between calls, so one detector can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct CardDetector {
    config: DetectorConfig,
}

impl CardDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect cards in an RGBA image.
    pub fn detect_image(&self, image: &RgbaImage) -> DetectionResult {
        self.detect_with_observer(image, &mut NoopObserver)
    }

    /// Detect cards in any decoded image, converting it to RGBA first.
    pub fn detect_dynamic(&self, image: &DynamicImage) -> DetectionResult {
        self.detect_image(&image.to_rgba8())
    }

    /// Detect cards in a tightly packed RGBA8 buffer.
    ///
    /// Zero-sized images yield an empty result; a buffer whose length does not
    /// match `width * height * 4` is rejected.
    pub fn detect_pixels(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<DetectionResult, DetectError> {
        if width == 0 || height == 0 {
            return Ok(DetectionResult::default());
        }
        let expected = width as usize * height as usize * 4;
        let mismatch = DetectError::BufferSizeMismatch {
            width,
            height,
            expected,
            actual: pixels.len(),
        };
        if pixels.len() != expected {
            return Err(mismatch);
        }
        let image = RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or(mismatch)?;
        Ok(self.detect_image(&image))
    }

    /// Run the full pipeline, reporting each stage to `observer`.
    pub fn detect_with_observer(
        &self,
        image: &RgbaImage,
        observer: &mut dyn DetectionObserver,
    ) -> DetectionResult {
        let _guard = timing_guard("cardscan_core::detect", Level::Debug);
        let (width, height) = image.dimensions();
        let mut trace = StageTrace::new(observer);
        if width == 0 || height == 0 {
            return DetectionResult::default();
        }
        let config = &self.config;

        let sharpened = {
            let _guard = timing_guard("cardscan_core::sharpen", Level::Trace);
            sharpen(image)
        };
        trace.complete(Stage::Preprocess, format!("sharpened {width}x{height} image"));

        let gray = to_grayscale(&sharpened);
        drop(sharpened);
        trace.complete(Stage::Grayscale, "converted to grayscale".to_string());

        let radius = blur_radius(config.blur_sigma);
        let blurred = {
            let _guard = timing_guard("cardscan_core::blur", Level::Trace);
            box_blur(&gray, radius)
        };
        drop(gray);
        trace.complete(Stage::Blur, format!("applied box blur (radius {radius})"));

        let edge_image = {
            let _guard = timing_guard("cardscan_core::sobel", Level::Trace);
            sobel_edges(&blurred, config.gradient_threshold)
        };
        drop(blurred);
        trace.observer.on_edge_map(&edge_image);
        let edges = EdgeMap::new(edge_image, config.edge_value_threshold);
        trace.complete(Stage::EdgeThreshold, "built binary edge map".to_string());

        let grid = SearchGrid::for_image(width, height);
        let params = GenerationParams {
            confidence_threshold: config.confidence_threshold,
            card_aspect_ratio: config.card_aspect_ratio,
            parallel: config.parallel,
        };
        let generation = {
            let _guard = timing_guard("cardscan_core::generate", Level::Debug);
            let observer: &dyn DetectionObserver = &*trace.observer;
            generate_candidates(&edges, &grid, &params, &|| observer.is_cancelled())
        };
        drop(edges);
        trace.complete(
            Stage::Generate,
            format!(
                "found {} candidates in {} windows (step {}){}",
                generation.candidates.len(),
                generation.evaluated,
                grid.step,
                if generation.cancelled { ", cancelled" } else { "" }
            ),
        );

        let suppressed = non_max_suppression(generation.candidates, config.nms_threshold);
        trace.complete(
            Stage::Suppress,
            format!("{} candidates after non-max suppression", suppressed.len()),
        );

        let available = suppressed.len();
        let rectangles = rank_and_filter(suppressed, width, height, &config.rank);
        trace.complete(
            Stage::Rank,
            format!("ranked and filtered {available} candidates"),
        );
        trace.complete(
            Stage::Truncate,
            format!("returning {} rectangles", rectangles.len()),
        );

        DetectionResult {
            rectangles,
            debug_trace: trace.finish(),
        }
    }
}

/// Collects stage messages and forwards them to the observer and the log.
struct StageTrace<'a> {
    observer: &'a mut dyn DetectionObserver,
    messages: Vec<String>,
}

impl<'a> StageTrace<'a> {
    fn new(observer: &'a mut dyn DetectionObserver) -> Self {
        Self {
            observer,
            messages: Vec::new(),
        }
    }

    fn complete(&mut self, stage: Stage, message: String) {
        debug!("{}: {message}", stage.as_str());
        self.observer.on_stage(stage, &message);
        self.messages.push(message);
    }

    fn finish(self) -> Vec<String> {
        self.messages
    }
}

/// Detect cards in a tightly packed RGBA8 buffer with the default thresholds.
pub fn detect(pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult, DetectError> {
    CardDetector::default().detect_pixels(pixels, width, height)
}
