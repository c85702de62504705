//! Tool configuration module.
//!
//! Handles loading, validating, and merging `rasterkit.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change,
//! and command-line flags override both.
//!
//! ## Config File Location
//!
//! `--config <FILE>` names the file explicitly (it must exist). Without the
//! flag, `rasterkit.toml` in the working directory is used when present.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [convert]
//! quality = 0.92            # Lossy encode quality for conversions (0.0-1.0)
//!
//! [compress]
//! quality = 0.85            # Starting quality for compression (0.0-1.0)
//!
//! [edit]
//! quality = 0.92            # Quality when re-encoding edited images (0.0-1.0)
//!
//! [favicon]
//! size = 32                 # 16, 32 or 48
//!
//! [placeholder]
//! text = "Placeholder"
//! background = "#cccccc"
//! color = "#333333"
//!
//! [processing]
//! max_threads = 4           # Max pixel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::color::parse_hex_color;
use crate::imaging::{FaviconSize, PlaceholderSpec, Quality, Rgba};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "rasterkit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `rasterkit.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RasterConfig {
    pub convert: QualityConfig,
    pub compress: QualityConfig,
    pub edit: QualityConfig,
    pub favicon: FaviconConfig,
    pub placeholder: PlaceholderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            convert: QualityConfig {
                quality: Quality::DEFAULT.value(),
            },
            compress: QualityConfig {
                quality: Quality::COMPRESS_DEFAULT.value(),
            },
            edit: QualityConfig {
                quality: Quality::DEFAULT.value(),
            },
            favicon: FaviconConfig::default(),
            placeholder: PlaceholderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl RasterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, q) in [
            ("convert", &self.convert),
            ("compress", &self.compress),
            ("edit", &self.edit),
        ] {
            if !q.quality.is_finite() || !(0.0..=1.0).contains(&q.quality) {
                return Err(ConfigError::Validation(format!(
                    "{section}.quality must be between 0.0 and 1.0"
                )));
            }
        }
        FaviconSize::try_from(self.favicon.size)
            .map_err(|e| ConfigError::Validation(format!("favicon.size: {e}")))?;
        self.placeholder.background_rgba()?;
        self.placeholder.color_rgba()?;
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn convert_quality(&self) -> Quality {
        Quality::new(self.convert.quality)
    }

    pub fn compress_quality(&self) -> Quality {
        Quality::new(self.compress.quality)
    }

    pub fn edit_quality(&self) -> Quality {
        Quality::new(self.edit.quality)
    }

    /// Only meaningful after [`validate`](Self::validate); falls back to 32.
    pub fn favicon_size(&self) -> FaviconSize {
        FaviconSize::try_from(self.favicon.size).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// Lossy encode quality, 0.0 (smallest) to 1.0 (best).
    pub quality: f32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            quality: Quality::DEFAULT.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaviconConfig {
    pub size: u32,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            size: FaviconSize::default().pixels(),
        }
    }
}

/// Label and colors used by `placeholder` when flags don't override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    pub text: String,
    /// Hex color: `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub background: String,
    pub color: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            text: "Placeholder".to_string(),
            background: "#cccccc".to_string(),
            color: "#333333".to_string(),
        }
    }
}

impl PlaceholderConfig {
    pub fn background_rgba(&self) -> Result<Rgba, ConfigError> {
        parse_color("placeholder.background", &self.background)
    }

    pub fn color_rgba(&self) -> Result<Rgba, ConfigError> {
        parse_color("placeholder.color", &self.color)
    }

    /// A [`PlaceholderSpec`] of the given size using these defaults.
    pub fn spec(&self, width: u32, height: u32) -> Result<PlaceholderSpec, ConfigError> {
        Ok(PlaceholderSpec {
            width,
            height,
            text: self.text.clone(),
            background: self.background_rgba()?,
            color: self.color_rgba()?,
        })
    }
}

/// Parse a hex color, naming the offending key on failure.
pub fn parse_color(key: &str, value: &str) -> Result<Rgba, ConfigError> {
    parse_hex_color(value).ok_or_else(|| {
        ConfigError::Validation(format!(
            "{key}: '{value}' is not a hex color (#rgb, #rrggbb or #rrggbbaa)"
        ))
    })
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of rayon worker threads for pixel transforms.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Worker threads for per-pixel transforms: `[processing] max_threads`,
/// never more than the machine has.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    match config.max_threads {
        Some(limit) => limit.min(cores),
        None => cores,
    }
}

/// `RasterConfig::default()` as TOML, the layer `rasterkit.toml` sits on.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RasterConfig::default()).expect("default config must serialize")
}

/// Lay `overlay` over `base`. Sections merge per key, so a file that only
/// sets `[compress] quality` keeps every other default; any other value
/// in `overlay` wins outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut merged), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            toml::Value::Table(merged)
        }
        (_, replacement) => replacement,
    }
}

/// Parse `path` as TOML; a missing file is `None`, not an error.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(toml::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Defaults plus user overrides, checked by [`RasterConfig::validate`].
pub fn resolve_config(
    defaults: toml::Value,
    user: Option<toml::Value>,
) -> Result<RasterConfig, ConfigError> {
    let merged = user.into_iter().fold(defaults, merge_toml);
    let config: RasterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// An explicit path must exist. Otherwise `rasterkit.toml` in `dir` is used
/// if present, and the stock defaults if not.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<RasterConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(toml::from_str(&fs::read_to_string(path)?)?),
        None => load_raw_config(&dir.join(CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `rasterkit.toml` with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rasterkit configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Format conversion
# ---------------------------------------------------------------------------
[convert]
# Encode quality for lossy targets (JPEG, AVIF), 0.0 to 1.0.
quality = 0.92

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compress]
# Starting quality. A second attempt backs off to 70% of this.
quality = 0.85

# ---------------------------------------------------------------------------
# Single-image edits (resize, rotate, flip, grayscale, saturate, hue)
# ---------------------------------------------------------------------------
[edit]
# Quality used when the edited image is written back in a lossy format.
quality = 0.92

# ---------------------------------------------------------------------------
# Favicon
# ---------------------------------------------------------------------------
[favicon]
# Edge length in pixels: 16, 32 or 48.
size = 32

# ---------------------------------------------------------------------------
# Placeholder images
# ---------------------------------------------------------------------------
[placeholder]
text = "Placeholder"
# Colors as #rgb, #rrggbb or #rrggbbaa.
background = "#cccccc"
color = "#333333"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads for per-pixel transforms.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}
