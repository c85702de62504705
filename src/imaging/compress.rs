//! Quality-targeted compression.
//!
//! A bounded search, not an optimizer: at most three encodes per image, and
//! the first candidate that beats the original size wins.
//!
//! ```text
//! lossless source (PNG, BMP, GIF, TIFF, ICO)
//!   1. flatten onto white → JPEG @ q            smaller? → JpegFromLossless
//!   2. downscale by √q   → PNG                  smaller? → DownscaledPng
//!   3. otherwise the JPEG from step 1                     → LossyFallback
//!
//! JPEG, WebP, AVIF source
//!   1. re-encode @ q                            smaller? → ReEncoded
//!   2. re-encode @ q × 0.7                      smaller? → ReducedQuality
//!   3. otherwise the smaller attempt (first on ties)      → BestAttempt
//! ```
//!
//! WebP encoding is lossless, so a WebP source ends up re-encoded losslessly
//! at the same size it started with.
//!
//! A PNG input can come back as JPEG from step 1. The input bytes are never
//! handed back, so a result may be larger than the input when nothing helped.

use super::backend::ImageBackend;
use super::calculations::quality_scaled_dimensions;
use super::format::{EncodedBlob, ImageFormat};
use super::operations::{OperationError, Result};
use super::params::Quality;
use super::surface::{Surface, WHITE};
use super::transform::{flatten, resize};
use tracing::debug;

/// Multiplier applied to quality for the second lossy attempt.
pub const QUALITY_BACKOFF: f32 = 0.7;

/// Which branch of the search produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStrategy {
    JpegFromLossless,
    DownscaledPng,
    LossyFallback,
    ReEncoded,
    ReducedQuality,
    BestAttempt,
}

#[derive(Debug, Clone)]
pub struct Compressed {
    pub blob: EncodedBlob,
    pub strategy: CompressionStrategy,
}

/// Compress an encoded image. See the [module docs](self) for the search.
pub fn compress(
    backend: &impl ImageBackend,
    source: &EncodedBlob,
    quality: Quality,
) -> Result<Compressed> {
    let surface = backend.decode(source)?;
    let original = source.len();
    match source.image_format() {
        Some(format) if format.recompresses_in_place() && backend.can_encode(format) => {
            compress_in_place(backend, &surface, format, original, quality)
        }
        _ => compress_lossless(backend, &surface, original, quality),
    }
}

fn compress_lossless(
    backend: &impl ImageBackend,
    surface: &Surface,
    original: usize,
    quality: Quality,
) -> Result<Compressed> {
    let jpeg = backend.encode(&flatten(surface, WHITE), ImageFormat::Jpeg, quality)?;
    debug!(original, jpeg = jpeg.len(), "lossless source: JPEG attempt");
    if jpeg.len() < original {
        return Ok(done(jpeg, CompressionStrategy::JpegFromLossless));
    }

    let (w, h) = quality_scaled_dimensions(surface.width(), surface.height(), quality.value());
    let scaled = resize(surface, w, h).map_err(OperationError::Transform)?;
    let png = backend.encode(&scaled, ImageFormat::Png, quality)?;
    debug!(original, png = png.len(), width = w, height = h, "downscaled PNG attempt");
    if png.len() < original {
        return Ok(done(png, CompressionStrategy::DownscaledPng));
    }
    Ok(done(jpeg, CompressionStrategy::LossyFallback))
}

fn compress_in_place(
    backend: &impl ImageBackend,
    surface: &Surface,
    format: ImageFormat,
    original: usize,
    quality: Quality,
) -> Result<Compressed> {
    let first = backend.encode(surface, format, quality)?;
    debug!(original, %format, attempt = first.len(), "re-encode attempt");
    if first.len() < original {
        return Ok(done(first, CompressionStrategy::ReEncoded));
    }

    let reduced = quality.scaled(QUALITY_BACKOFF);
    let second = backend.encode(surface, format, reduced)?;
    debug!(original, %format, attempt = second.len(), quality = reduced.percent(), "reduced-quality attempt");
    if second.len() < original {
        return Ok(done(second, CompressionStrategy::ReducedQuality));
    }

    let best = if second.len() < first.len() { second } else { first };
    Ok(done(best, CompressionStrategy::BestAttempt))
}

fn done(blob: EncodedBlob, strategy: CompressionStrategy) -> Compressed {
    debug!(?strategy, bytes = blob.len(), "compression finished");
    Compressed { blob, strategy }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{garbage_blob, mock_jpeg, mock_png, solid_surface};

    #[test]
    fn png_becomes_jpeg_when_smaller() {
        let backend = MockBackend::new().with_encode_sizes(&[100]);
        let out = compress(&backend, &mock_png(500), Quality::new(0.85)).unwrap();
        assert_eq!(out.strategy, CompressionStrategy::JpegFromLossless);
        assert_eq!(out.blob.image_format(), Some(ImageFormat::Jpeg));
        assert_eq!(backend.encodes().len(), 1);
    }

    #[test]
    fn png_falls_back_to_downscale() {
        let backend = MockBackend::new().with_encode_sizes(&[600, 300]);
        let out = compress(&backend, &mock_png(500), Quality::new(0.81)).unwrap();
        assert_eq!(out.strategy, CompressionStrategy::DownscaledPng);
        assert_eq!(out.blob.image_format(), Some(ImageFormat::Png));
        // 8x8 mock surface scaled by sqrt(0.81) = 0.9
        assert!(matches!(
            backend.encodes()[1],
            RecordedOp::Encode {
                format: ImageFormat::Png,
                width: 7,
                height: 7,
                ..
            }
        ));
    }

    #[test]
    fn png_returns_jpeg_when_nothing_beats_original() {
        let backend = MockBackend::new().with_encode_sizes(&[600, 700]);
        let out = compress(&backend, &mock_png(500), Quality::new(0.85)).unwrap();
        assert_eq!(out.strategy, CompressionStrategy::LossyFallback);
        assert_eq!(out.blob.image_format(), Some(ImageFormat::Jpeg));
        assert_eq!(out.blob.len(), 600);
    }

    #[test]
    fn lossless_jpeg_attempt_is_flattened() {
        let backend = MockBackend::with_surface(solid_surface(4, 4, [0, 0, 0, 0]))
            .with_encode_sizes(&[1]);
        compress(&backend, &mock_png(500), Quality::new(0.85)).unwrap();
        assert!(matches!(
            backend.encodes()[0],
            RecordedOp::Encode {
                format: ImageFormat::Jpeg,
                quality: 85,
                ..
            }
        ));
    }

    #[test]
    fn webp_reencoded_as_webp() {
        let backend = MockBackend::new().with_encode_sizes(&[400]);
        let webp = EncodedBlob::image(ImageFormat::WebP, vec![0; 500]);
        let out = compress(&backend, &webp, Quality::new(0.85)).unwrap();
        assert_eq!(out.strategy, CompressionStrategy::ReEncoded);
        assert_eq!(out.blob.image_format(), Some(ImageFormat::WebP));
    }

    #[test]
    fn jpeg_reencoded_in_place() {
        let backend = MockBackend::new().with_encode_sizes(&[400]);
        let out = compress(&backend, &mock_jpeg(500), Quality::new(0.85)).unwrap();
        assert_eq!(out.strategy, CompressionStrategy::ReEncoded);
        assert_eq!(out.blob.image_format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn jpeg_backs_off_quality() {
        let backend = MockBackend::new().with_encode_sizes(&[520, 450]);
        let out = compress(&backend, &mock_jpeg(500), Quality::new(0.85)).unwrap();
        assert_eq!(out.strategy, CompressionStrategy::ReducedQuality);
        assert_eq!(out.blob.len(), 450);
        let qualities: Vec<u8> = backend
            .encodes()
            .into_iter()
            .map(|op| match op {
                RecordedOp::Encode { quality, .. } => quality,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(qualities[0], 85);
        assert!((59..=60).contains(&qualities[1]), "{qualities:?}");
    }

    #[test]
    fn jpeg_returns_minimum_attempt_when_neither_wins() {
        let backend = MockBackend::new().with_encode_sizes(&[700, 650]);
        let out = compress(&backend, &mock_jpeg(500), Quality::new(0.85)).unwrap();
        assert_eq!(out.strategy, CompressionStrategy::BestAttempt);
        assert_eq!(out.blob.len(), 650);

        let backend = MockBackend::new().with_encode_sizes(&[600, 600]);
        let out = compress(&backend, &mock_jpeg(500), Quality::new(0.85)).unwrap();
        assert_eq!(out.blob.len(), 600);
        assert_eq!(backend.encodes().len(), 2);
    }

    #[test]
    fn never_more_than_three_encodes() {
        let backend = MockBackend::new().with_encode_sizes(&[10_000, 10_000, 10_000]);
        compress(&backend, &mock_png(1), Quality::new(0.5)).unwrap();
        assert!(backend.encodes().len() <= 3);
    }

    #[test]
    fn undecodable_input_is_an_error() {
        let backend = MockBackend::new();
        let err = compress(&backend, &garbage_blob(), Quality::new(0.85)).unwrap_err();
        assert!(matches!(err, OperationError::Backend(_)));
    }
}
