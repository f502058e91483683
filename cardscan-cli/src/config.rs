//! Configuration loading and CLI override logic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cardscan_utils::{
    config::{AppSettings, default_settings_path},
    normalize_path,
};
use log::info;

use crate::args::DetectArgs;

/// Load application settings from a file or use defaults.
pub fn load_settings(config_path: Option<&PathBuf>) -> Result<AppSettings> {
    if let Some(path) = config_path {
        let resolved = normalize_path(path)?;
        let settings = AppSettings::load_from_path(&resolved)?;
        info!("Loaded settings from {}", resolved.display());
        Ok(settings)
    } else {
        let default_path = default_settings_path();
        if default_path.exists() {
            let settings = AppSettings::load_from_path(&default_path).with_context(|| {
                format!(
                    "failed to load default settings from {}",
                    default_path.display()
                )
            })?;
            info!("Loaded settings from {}", default_path.display());
            Ok(settings)
        } else {
            Ok(AppSettings::default())
        }
    }
}

/// Apply command-line arguments to override loaded or default settings.
pub fn apply_cli_overrides(settings: &mut AppSettings, args: &DetectArgs) {
    if args.telemetry {
        settings.telemetry.enabled = true;
    }
    if let Some(level) = args.telemetry_level.as_ref() {
        let normalized = level.trim();
        if !normalized.is_empty() {
            let lower = normalized.to_ascii_lowercase();
            if lower == "off" {
                settings.telemetry.enabled = false;
            }
            settings.telemetry.level = lower;
        }
    }

    if let Some(confidence) = args.confidence_threshold {
        settings.detection.confidence_threshold = confidence;
    }
    if let Some(nms) = args.nms_threshold {
        settings.detection.nms_threshold = nms;
    }
    if let Some(top_k) = args.top_k {
        settings.detection.top_k = top_k;
    }
    if args.sequential {
        settings.detection.parallel = false;
    }

    if let Some(color) = args.color {
        settings.annotation.color = color;
    }
    if let Some(thickness) = args.thickness {
        settings.annotation.thickness = thickness.max(1);
    }

    settings.detection.sanitize();
}
