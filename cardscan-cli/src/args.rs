//! Command-line argument definitions for cardscan.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use cardscan_utils::RgbaColor;

/// Find trading-card shaped rectangles in images or directories.
#[derive(Debug, Parser)]
#[command(name = "cardscan", author, version, about)]
pub struct DetectArgs {
    /// Path to an image file or a directory containing images.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Optional settings JSON. Defaults to `config/cardscan_settings.json` when present, otherwise built-in parameters.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write detections to a JSON file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Directory to write annotated images with rectangles overlaid.
    #[arg(long)]
    pub annotate: Option<PathBuf>,

    /// Directory to write the binary edge map of each image.
    #[arg(long)]
    pub edge_maps: Option<PathBuf>,

    /// Override the confidence cutoff (0.0..=1.0).
    #[arg(long)]
    pub confidence_threshold: Option<f64>,

    /// Override the NMS IoU threshold (0.0..=1.0).
    #[arg(long)]
    pub nms_threshold: Option<f64>,

    /// Override the maximum number of rectangles per image.
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Outline color for annotated images (#RGB, #RRGGBB or #RRGGBBAA).
    #[arg(long, value_name = "COLOR")]
    pub color: Option<RgbaColor>,

    /// Outline thickness in pixels for annotated images.
    #[arg(long)]
    pub thickness: Option<u32>,

    /// Scan candidate windows on a single thread.
    #[arg(long, action = ArgAction::SetTrue)]
    pub sequential: bool,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,

    /// Include the per-stage debug trace in the JSON output.
    #[arg(long, action = ArgAction::SetTrue)]
    pub trace: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let args = DetectArgs::try_parse_from([
            "cardscan",
            "--input",
            "photos",
            "--top-k",
            "3",
            "--confidence-threshold",
            "0.5",
            "--color",
            "#00ff00",
            "--sequential",
            "--trace",
        ])
        .expect("valid arguments");
        assert_eq!(args.input, PathBuf::from("photos"));
        assert_eq!(args.top_k, Some(3));
        assert_eq!(args.confidence_threshold, Some(0.5));
        assert_eq!(args.color, Some(RgbaColor::opaque(0, 255, 0)));
        assert!(args.sequential && args.trace);
        assert!(!args.telemetry);
    }

    #[test]
    fn input_is_required() {
        assert!(DetectArgs::try_parse_from(["cardscan"]).is_err());
    }

    #[test]
    fn rejects_bad_color() {
        assert!(DetectArgs::try_parse_from(["cardscan", "-i", "a.png", "--color", "teal"]).is_err());
    }
}
