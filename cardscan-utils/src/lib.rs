//! Common helpers shared across cardscan crates.

/// Annotation color parsing and conversion.
pub mod color;
/// Persisted detector, telemetry and annotation settings.
pub mod config;
/// Image loading helpers.
pub mod image_utils;
/// Synthetic card scenes for tests and benches.
pub mod synthetic;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use color::{RgbaColor, parse_hex_color};
pub use config::{AnnotationSettings, AppSettings, DetectionSettings, TelemetrySettings};
pub use image_utils::{has_image_extension, load_image, load_rgba};
pub use synthetic::{SceneBuilder, outlined_cards};
pub use telemetry::{
    TimingGuard, configure as configure_telemetry, telemetry_allows, telemetry_enabled,
    telemetry_level, timing_guard, timing_guard_if,
};

/// Initialize logging once for CLI and library test environments.
///
/// This function respects the `RUST_LOG` environment variable if it is set.
/// Otherwise, it falls back to the provided default filter level.
///
/// # Arguments
///
/// * `default_filter` - The `LevelFilter` to use if `RUST_LOG` is not set.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module(telemetry::TELEMETRY_TARGET, LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
///
/// # Arguments
///
/// * `path` - The path to validate and normalize.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
