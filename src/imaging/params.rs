//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between callers (the CLI, the batch coordinator) and the
//! transform engine / backend, and they replace loose parameter lists with
//! one tagged value per operation.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality in `[0, 1]`. Clamped on construction.
//! - [`FlipAxis`] — Mirror direction for flips.
//! - [`TransformRequest`] — One pixel transform and its parameters.
//! - [`FaviconSize`] — The three supported favicon edge lengths.
//! - [`PlaceholderSpec`] — Size, label and colors of a generated placeholder.

use super::surface::Rgba;
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    /// Default for conversions and single-file edits.
    pub const DEFAULT: Quality = Quality(0.92);
    /// Default for compression.
    pub const COMPRESS_DEFAULT: Quality = Quality(0.85);

    /// Clamp into `[0, 1]`; non-finite values fall back to [`Quality::DEFAULT`].
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self::DEFAULT
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Encoder scale: `round(q · 100)` clamped to `1..=100`.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// This quality multiplied by `factor`, clamped again.
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.0 * factor)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * 100.0).round())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror left ↔ right.
    Horizontal,
    /// Mirror top ↔ bottom.
    Vertical,
}

impl FromStr for FlipAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" | "x" => Ok(FlipAxis::Horizontal),
            "vertical" | "v" | "y" => Ok(FlipAxis::Vertical),
            other => Err(format!(
                "unknown flip axis '{other}' (expected horizontal or vertical)"
            )),
        }
    }
}

/// A single pixel transform with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformRequest {
    /// Resample to exactly `width × height`; no aspect-ratio enforcement.
    Resize { width: u32, height: u32 },
    /// Clockwise rotation by any finite angle, canvas grown to fit.
    Rotate { degrees: f64 },
    Flip(FlipAxis),
    Grayscale,
    /// 0 = grayscale, 1 = unchanged, >1 = oversaturated.
    Saturation { factor: f32 },
    /// Hue rotation in degrees; any finite value, wraps mod 360.
    Hue { degrees: f64 },
}

impl TransformRequest {
    /// Filename suffix for outputs of this transform.
    pub fn suffix(&self) -> &'static str {
        match self {
            TransformRequest::Resize { .. } => "_resized",
            TransformRequest::Rotate { .. } => "_rotated",
            TransformRequest::Flip(_) => "_flipped",
            TransformRequest::Grayscale => "_grayscale",
            TransformRequest::Saturation { .. } => "_saturated",
            TransformRequest::Hue { .. } => "_hue",
        }
    }
}

/// Favicon edge length in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaviconSize {
    Px16,
    #[default]
    Px32,
    Px48,
}

impl FaviconSize {
    pub fn pixels(self) -> u32 {
        match self {
            FaviconSize::Px16 => 16,
            FaviconSize::Px32 => 32,
            FaviconSize::Px48 => 48,
        }
    }
}

impl TryFrom<u32> for FaviconSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(FaviconSize::Px16),
            32 => Ok(FaviconSize::Px32),
            48 => Ok(FaviconSize::Px48),
            other => Err(format!("favicon size must be 16, 32 or 48, got {other}")),
        }
    }
}

impl FromStr for FaviconSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("favicon size must be 16, 32 or 48, got '{s}'"))?;
        Self::try_from(value)
    }
}

/// A generated placeholder: solid background with a centered label.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderSpec {
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub background: Rgba,
    pub color: Rgba,
}

impl Default for PlaceholderSpec {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            text: "Placeholder".to_string(),
            background: [0xcc, 0xcc, 0xcc, 0xff],
            color: [0x33, 0x33, 0x33, 0xff],
        }
    }
}
