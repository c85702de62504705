//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, BMP, ICO, TIFF) | `image::load_from_memory_with_format` |
//! | Decode (AVIF) | not available: the `avif` feature only ships the encoder |
//! | Encode → JPEG | `JpegEncoder::new_with_quality`, alpha flattened onto white |
//! | Encode → PNG | `PngEncoder` (best compression, adaptive filter) |
//! | Encode → WebP | `WebPEncoder::new_lossless` (quality ignored) |
//! | Encode → BMP | `BmpEncoder`, RGB8 flattened onto white |
//! | Encode → ICO | `IcoEncoder`, RGBA8, ≤ 256×256 |
//! | Encode → AVIF | `AvifEncoder::new_with_speed_quality` (rav1e, speed 6) |

use super::backend::{BackendError, ImageBackend};
use super::format::{EncodedBlob, ImageFormat};
use super::params::Quality;
use super::surface::{Surface, WHITE};
use super::transform::flatten;
use image::codecs::avif::AvifEncoder;
use image::codecs::bmp::BmpEncoder;
use image::codecs::ico::IcoEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};
use tracing::debug;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// ICO directory entries store each dimension in one byte (0 meaning 256).
const ICO_MAX_EDGE: u32 = 256;

/// Returns the file extensions whose decoders are compiled in.
///
/// AVIF is excluded: it can be produced but not read back.
pub fn supported_input_extensions() -> Vec<&'static str> {
    ImageFormat::ALL
        .into_iter()
        .filter(|f| *f != ImageFormat::Avif)
        .flat_map(|f| f.extensions().iter().copied())
        .collect()
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the format-to-encoder mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::WebP => image::ImageFormat::WebP,
        ImageFormat::Bmp => image::ImageFormat::Bmp,
        ImageFormat::Ico => image::ImageFormat::Ico,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Tiff => image::ImageFormat::Tiff,
        ImageFormat::Avif => image::ImageFormat::Avif,
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, blob: &EncodedBlob) -> Result<Surface, BackendError> {
        let format = blob
            .image_format()
            .ok_or_else(|| BackendError::Decode("unrecognized image data".to_string()))?;
        if format == ImageFormat::Avif {
            return Err(BackendError::Decode(
                "AVIF input is not supported (AVIF is encode-only)".to_string(),
            ));
        }

        let img = image::load_from_memory_with_format(blob.bytes(), codec_format(format))
            .map_err(|e| BackendError::Decode(format!("{format}: {e}")))?;
        debug!(
            %format,
            width = img.width(),
            height = img.height(),
            bytes = blob.len(),
            "decoded"
        );
        Surface::from_rgba_image(img.into_rgba8())
            .map_err(|e| BackendError::Decode(format!("{format}: {e}")))
    }

    fn encode(
        &self,
        surface: &Surface,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<EncodedBlob, BackendError> {
        let encoded = match format {
            ImageFormat::Jpeg => encode_jpeg(surface, quality),
            ImageFormat::Png => encode_png(surface),
            ImageFormat::WebP => encode_webp(surface),
            ImageFormat::Bmp => encode_bmp(surface),
            ImageFormat::Ico => encode_ico(surface),
            ImageFormat::Avif => encode_avif(surface, quality),
            ImageFormat::Gif | ImageFormat::Tiff => {
                return Err(BackendError::UnsupportedFormat(format));
            }
        };
        let bytes = encoded.map_err(|e| BackendError::Encode {
            format,
            message: e.to_string(),
        })?;
        debug!(%format, quality = quality.percent(), bytes = bytes.len(), "encoded");
        Ok(EncodedBlob::image(format, bytes))
    }

    fn can_encode(&self, format: ImageFormat) -> bool {
        !matches!(format, ImageFormat::Gif | ImageFormat::Tiff)
    }
}

/// Drop alpha after compositing onto white, for formats without an alpha channel.
fn opaque_rgb(surface: &Surface) -> Vec<u8> {
    let flat = flatten(surface, WHITE);
    flat.pixels()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

fn encode_jpeg(surface: &Surface, quality: Quality) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    let rgb = opaque_rgb(surface);
    JpegEncoder::new_with_quality(&mut buffer, quality.percent()).write_image(
        &rgb,
        surface.width(),
        surface.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

fn encode_png(surface: &Surface) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive)
        .write_image(
            surface.pixels(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )?;
    Ok(buffer)
}

/// The pure-Rust WebP encoder is lossless only, so there is no quality knob.
fn encode_webp(surface: &Surface) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    WebPEncoder::new_lossless(&mut buffer).write_image(
        surface.pixels(),
        surface.width(),
        surface.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

fn encode_bmp(surface: &Surface) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    let rgb = opaque_rgb(surface);
    BmpEncoder::new(&mut buffer).write_image(
        &rgb,
        surface.width(),
        surface.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

fn encode_ico(surface: &Surface) -> Result<Vec<u8>, ImageError> {
    let (w, h) = surface.dimensions();
    if w > ICO_MAX_EDGE || h > ICO_MAX_EDGE {
        return Err(ImageError::Parameter(
            image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ),
        ));
    }
    let mut buffer = Vec::new();
    IcoEncoder::new(&mut buffer).write_image(surface.pixels(), w, h, ExtendedColorType::Rgba8)?;
    Ok(buffer)
}

fn encode_avif(surface: &Surface, quality: Quality) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    AvifEncoder::new_with_speed_quality(&mut buffer, AVIF_SPEED, quality.percent()).write_image(
        surface.pixels(),
        surface.width(),
        surface.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}
