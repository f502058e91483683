//! Shared configuration types consumed across the cardscan workspace.
//!
//! Settings are plain serde structs so they can be persisted as JSON and
//! reused by library callers and the CLI. Every struct uses `#[serde(default)]`
//! so partial files fill in the built-in detector constants.

use crate::color::RgbaColor;

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Standard trading card width/height ratio (2.5in x 3.5in).
pub const CARD_ASPECT_RATIO: f64 = 2.5 / 3.5;

/// Detection thresholds and filters.
///
/// The defaults are the fixed constants the detector was calibrated with;
/// changing them trades recall for precision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionSettings {
    /// Candidates must score strictly above this to be kept.
    pub confidence_threshold: f64,
    /// Overlap (IoU) above which two candidates are considered duplicates.
    pub nms_threshold: f64,
    /// Maximum number of rectangles returned per image.
    pub top_k: usize,
    /// Sobel gradient magnitude a pixel must exceed to become an edge.
    pub gradient_threshold: f64,
    /// Edge-map value a perimeter sample must exceed to count as an edge hit.
    pub edge_value_threshold: u8,
    /// Gaussian sigma approximated by the box blur (radius = ceil(3 * sigma)).
    pub blur_sigma: f64,
    /// Width/height ratio rewarded by the aspect bonus.
    pub card_aspect_ratio: f64,
    /// Smallest aspect ratio kept after ranking.
    pub min_aspect_ratio: f64,
    /// Largest aspect ratio kept after ranking.
    pub max_aspect_ratio: f64,
    /// Minimum side as a fraction of `min(width, height)`.
    pub min_size_fraction: f64,
    /// Maximum side as a fraction of `max(width, height)`.
    pub max_size_fraction: f64,
    /// Evaluate sliding-window rows on the rayon thread pool.
    pub parallel: bool,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
            nms_threshold: 0.3,
            top_k: 10,
            gradient_threshold: 50.0,
            edge_value_threshold: 200,
            blur_sigma: 1.4,
            card_aspect_ratio: CARD_ASPECT_RATIO,
            min_aspect_ratio: 0.4,
            max_aspect_ratio: 2.0,
            min_size_fraction: 0.05,
            max_size_fraction: 0.9,
            parallel: true,
        }
    }
}

impl DetectionSettings {
    /// Clamp values to ranges the pipeline can work with.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.confidence_threshold = finite_or(self.confidence_threshold, defaults.confidence_threshold)
            .clamp(0.0, 1.0);
        self.nms_threshold = finite_or(self.nms_threshold, defaults.nms_threshold).clamp(0.0, 1.0);
        self.gradient_threshold = finite_or(self.gradient_threshold, defaults.gradient_threshold).max(0.0);
        self.blur_sigma = finite_or(self.blur_sigma, defaults.blur_sigma).clamp(0.0, 16.0);
        if !(self.card_aspect_ratio.is_finite() && self.card_aspect_ratio > 0.0) {
            self.card_aspect_ratio = defaults.card_aspect_ratio;
        }
        self.min_aspect_ratio = finite_or(self.min_aspect_ratio, defaults.min_aspect_ratio).max(0.0);
        self.max_aspect_ratio = finite_or(self.max_aspect_ratio, defaults.max_aspect_ratio)
            .max(self.min_aspect_ratio);
        self.min_size_fraction = finite_or(self.min_size_fraction, defaults.min_size_fraction).clamp(0.0, 1.0);
        self.max_size_fraction = finite_or(self.max_size_fraction, defaults.max_size_fraction)
            .clamp(self.min_size_fraction, 1.0);
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }

    /// Update the level string from a `LevelFilter` value.
    pub fn set_level(&mut self, level: LevelFilter) {
        self.level = level.as_str().to_ascii_lowercase();
    }
}

/// How detections are drawn onto annotated copies of the input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnotationSettings {
    /// Outline color.
    pub color: RgbaColor,
    /// Outline thickness in pixels (drawn inward from the rectangle edge).
    pub thickness: u32,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            color: RgbaColor::default(),
            thickness: 3,
        }
    }
}

/// Persistent settings consumed by library callers and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppSettings {
    /// Detector thresholds.
    pub detection: DetectionSettings,
    /// Telemetry and diagnostics preferences.
    pub telemetry: TelemetrySettings,
    /// Overlay style for annotated output.
    pub annotation: AnnotationSettings,
}

impl AppSettings {
    /// Load settings from a JSON file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let mut settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        settings.detection.sanitize();
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON, overwriting any existing file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

/// Returns the default path for persisted settings (`config/cardscan_settings.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/cardscan_settings.json"))
        .unwrap_or_else(|_| PathBuf::from("config/cardscan_settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn default_settings_round_trip() {
        let file = NamedTempFile::new().expect("tempfile");
        let settings = AppSettings::default();
        settings.save_to_path(file.path()).expect("save");

        let loaded = AppSettings::load_from_path(file.path()).expect("load");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let file = NamedTempFile::new().expect("tempfile");
        let json = r#"{
            "detection": { "top_k": 3, "nms_threshold": 0.5 },
            "annotation": { "color": { "red": 0, "green": 255, "blue": 0 } }
        }"#;
        fs::write(file.path(), json).expect("write custom settings");

        let loaded = AppSettings::load_from_path(file.path()).expect("load");
        assert_eq!(loaded.detection.top_k, 3);
        assert_eq!(loaded.detection.nms_threshold, 0.5);
        assert_eq!(loaded.detection.confidence_threshold, 0.3);
        assert_eq!(loaded.detection.edge_value_threshold, 200);
        assert_eq!(loaded.annotation.color, RgbaColor::opaque(0, 255, 0));
        assert_eq!(loaded.annotation.thickness, 3);
        assert!(!loaded.telemetry.enabled);
        assert_eq!(loaded.telemetry.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn malformed_file_reports_path() {
        let file = NamedTempFile::new().expect("tempfile");
        fs::write(file.path(), "{ not json").expect("write");
        let err = AppSettings::load_from_path(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse settings JSON"));
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut settings = DetectionSettings {
            confidence_threshold: 4.0,
            nms_threshold: f64::NAN,
            card_aspect_ratio: -1.0,
            min_aspect_ratio: 3.0,
            max_aspect_ratio: 1.0,
            ..DetectionSettings::default()
        };
        settings.sanitize();
        assert_eq!(settings.confidence_threshold, 1.0);
        assert_eq!(settings.nms_threshold, 0.3);
        assert_eq!(settings.card_aspect_ratio, CARD_ASPECT_RATIO);
        assert_eq!(settings.max_aspect_ratio, 3.0);
    }

    #[test]
    fn telemetry_level_parses_variants() {
        let telemetry = TelemetrySettings {
            level: "TRACE".into(),
            ..TelemetrySettings::default()
        };
        assert_eq!(telemetry.level_filter(), LevelFilter::Trace);

        let telemetry = TelemetrySettings {
            level: "Warning".into(),
            ..TelemetrySettings::default()
        };
        assert_eq!(telemetry.level_filter(), LevelFilter::Warn);

        let mut telemetry = TelemetrySettings::default();
        telemetry.set_level(LevelFilter::Info);
        assert_eq!(telemetry.level, "info");
    }
}
