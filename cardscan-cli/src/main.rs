mod annotate;
mod args;
mod config;
mod input;
mod types;

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cardscan_core::{CardDetector, DetectorConfig, TraceRecorder};
use cardscan_utils::{
    config::AppSettings, configure_telemetry, init_logging, load_rgba, normalize_path,
};
use clap::Parser;
use log::{info, warn};

use crate::{
    annotate::{save_annotated, save_edge_map},
    args::DetectArgs,
    config::{apply_cli_overrides, load_settings},
    input::{collect_images, output_name},
    types::ImageDetections,
};

/// Where optional per-image artifacts go.
struct OutputDirs {
    root: PathBuf,
    annotate: Option<PathBuf>,
    edge_maps: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging(log::LevelFilter::Info)?;
    let args = DetectArgs::parse();

    let input_path = normalize_path(&args.input)?;
    let mut settings = load_settings(args.config.as_ref())?;
    apply_cli_overrides(&mut settings, &args);
    configure_telemetry(
        settings.telemetry.enabled,
        settings.telemetry.level_filter(),
    );

    let outputs = OutputDirs {
        root: if input_path.is_file() {
            input_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        } else {
            input_path.clone()
        },
        annotate: prepare_dir(args.annotate.as_deref())?,
        edge_maps: prepare_dir(args.edge_maps.as_deref())?,
    };

    let detector = CardDetector::new(DetectorConfig::from(&settings.detection));
    let images = collect_images(&input_path)?;
    if images.is_empty() {
        anyhow::bail!(
            "no images found at {} (supported extensions: jpg, jpeg, png, bmp, webp)",
            input_path.display()
        );
    }

    info!("Processing {} image(s)...", images.len());
    let mut results = Vec::with_capacity(images.len());
    for image_path in images {
        match process_image(&detector, &settings, &image_path, &outputs, args.trace) {
            Ok(record) => results.push(record),
            Err(err) => warn!("Failed to process {}: {err:#}", image_path.display()),
        }
    }

    if results.is_empty() {
        anyhow::bail!("all detections failed; cannot produce output");
    }

    if let Some(json_path) = args.json.as_ref() {
        if let Some(dir) = json_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let file = File::create(json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, &results).with_context(|| {
            format!("failed to write detection JSON to {}", json_path.display())
        })?;
        info!("Wrote detections to {}", json_path.display());
    } else {
        let json =
            serde_json::to_string_pretty(&results).context("failed to serialize detections")?;
        println!("{json}");
    }

    Ok(())
}

fn prepare_dir(dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    Ok(Some(normalize_path(dir)?))
}

fn process_image(
    detector: &CardDetector,
    settings: &AppSettings,
    image_path: &Path,
    outputs: &OutputDirs,
    with_trace: bool,
) -> Result<ImageDetections> {
    let image = load_rgba(image_path)?;
    let (width, height) = image.dimensions();

    let mut recorder = if outputs.edge_maps.is_some() {
        TraceRecorder::with_edge_map()
    } else {
        TraceRecorder::new()
    };
    let result = detector.detect_with_observer(&image, &mut recorder);
    info!(
        "{} -> {} rectangle(s)",
        image_path.display(),
        result.rectangles.len()
    );

    let mut record = ImageDetections::new(
        image_path.display().to_string(),
        width,
        height,
        &result,
        with_trace,
    );

    if let Some(dir) = outputs.annotate.as_ref() {
        let boxes: Vec<_> = result.rectangles.iter().map(|c| c.bbox).collect();
        let target = dir.join(output_name(image_path, &outputs.root, "_cards", "png"));
        match save_annotated(&image, &boxes, &settings.annotation, &target) {
            Ok(path) => {
                info!("Annotated image saved to {}", path.display());
                record.annotated = Some(path.display().to_string());
            }
            Err(err) => warn!("Failed to annotate {}: {err:#}", image_path.display()),
        }
    }

    if let (Some(dir), Some(edges)) = (outputs.edge_maps.as_ref(), recorder.edge_map.as_ref()) {
        let target = dir.join(output_name(image_path, &outputs.root, "_edges", "png"));
        match save_edge_map(edges, &target) {
            Ok(path) => record.edge_map = Some(path.display().to_string()),
            Err(err) => warn!("Failed to save edge map for {}: {err:#}", image_path.display()),
        }
    }

    Ok(record)
}
