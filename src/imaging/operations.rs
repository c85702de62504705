//! High-level single-file operations.
//!
//! These functions combine the backend with the pure transforms: decode,
//! transform or compress, encode. They take and return encoded blobs and
//! never touch the filesystem.
//!
//! Edits keep the source format when the backend can encode it and fall
//! back to PNG otherwise (a GIF rotated comes back as PNG).

use super::backend::{BackendError, ImageBackend};
use super::compress::compress;
use super::format::{EncodedBlob, ImageFormat};
use super::params::{FaviconSize, FlipAxis, PlaceholderSpec, Quality, TransformRequest};
use super::surface::Surface;
use super::transform::{self, TransformError};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Invalid transform: {0}")]
    Transform(#[from] TransformError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// Re-encode `file` as `target`. `None` quality means [`Quality::DEFAULT`].
pub fn convert_one(
    backend: &impl ImageBackend,
    file: &EncodedBlob,
    target: ImageFormat,
    quality: Option<Quality>,
) -> Result<EncodedBlob> {
    let surface = backend.decode(file)?;
    let quality = quality.unwrap_or_default();
    debug!(from = ?file.image_format(), to = %target, "convert");
    Ok(backend.encode(&surface, target, quality)?)
}

/// Compress `file`; the result format may differ from the source (PNG → JPEG).
pub fn compress_one(
    backend: &impl ImageBackend,
    file: &EncodedBlob,
    quality: Quality,
) -> Result<EncodedBlob> {
    Ok(compress(backend, file, quality)?.blob)
}

/// Format an edited image is written back in.
pub fn edit_format(backend: &impl ImageBackend, file: &EncodedBlob) -> ImageFormat {
    file.image_format()
        .filter(|format| backend.can_encode(*format))
        .unwrap_or(ImageFormat::Png)
}

/// Apply one transform at the default edit quality.
pub fn apply(
    backend: &impl ImageBackend,
    file: &EncodedBlob,
    request: &TransformRequest,
) -> Result<EncodedBlob> {
    apply_with_quality(backend, file, request, Quality::DEFAULT)
}

pub fn apply_with_quality(
    backend: &impl ImageBackend,
    file: &EncodedBlob,
    request: &TransformRequest,
    quality: Quality,
) -> Result<EncodedBlob> {
    let surface = backend.decode(file)?;
    let edited = transform::apply(&surface, request)?;
    let format = edit_format(backend, file);
    debug!(?request, %format, "edit");
    Ok(backend.encode(&edited, format, quality)?)
}

pub fn resize(
    backend: &impl ImageBackend,
    file: &EncodedBlob,
    width: u32,
    height: u32,
) -> Result<EncodedBlob> {
    apply(backend, file, &TransformRequest::Resize { width, height })
}

pub fn rotate(backend: &impl ImageBackend, file: &EncodedBlob, degrees: f64) -> Result<EncodedBlob> {
    apply(backend, file, &TransformRequest::Rotate { degrees })
}

pub fn flip(backend: &impl ImageBackend, file: &EncodedBlob, axis: FlipAxis) -> Result<EncodedBlob> {
    apply(backend, file, &TransformRequest::Flip(axis))
}

pub fn grayscale(backend: &impl ImageBackend, file: &EncodedBlob) -> Result<EncodedBlob> {
    apply(backend, file, &TransformRequest::Grayscale)
}

pub fn adjust_saturation(
    backend: &impl ImageBackend,
    file: &EncodedBlob,
    factor: f32,
) -> Result<EncodedBlob> {
    apply(backend, file, &TransformRequest::Saturation { factor })
}

pub fn adjust_hue(backend: &impl ImageBackend, file: &EncodedBlob, shift: f64) -> Result<EncodedBlob> {
    apply(backend, file, &TransformRequest::Hue { degrees: shift })
}

/// Stack all inputs top to bottom on white and encode as PNG.
pub fn merge(backend: &impl ImageBackend, files: &[EncodedBlob]) -> Result<EncodedBlob> {
    let surfaces = files
        .iter()
        .map(|file| backend.decode(file))
        .collect::<std::result::Result<Vec<Surface>, _>>()?;
    let merged = transform::merge(&surfaces)?;
    debug!(inputs = files.len(), width = merged.width(), height = merged.height(), "merge");
    Ok(backend.encode(&merged, ImageFormat::Png, Quality::DEFAULT)?)
}

/// Stretch to `size × size` and encode as ICO, or PNG when ICO is unavailable.
pub fn make_favicon(
    backend: &impl ImageBackend,
    file: &EncodedBlob,
    size: FaviconSize,
) -> Result<EncodedBlob> {
    let surface = backend.decode(file)?;
    let edge = size.pixels();
    let icon = transform::resize(&surface, edge, edge)?;
    let format = if backend.can_encode(ImageFormat::Ico) {
        ImageFormat::Ico
    } else {
        ImageFormat::Png
    };
    Ok(backend.encode(&icon, format, Quality::DEFAULT)?)
}

/// Render a placeholder as PNG.
pub fn placeholder(backend: &impl ImageBackend, spec: &PlaceholderSpec) -> Result<EncodedBlob> {
    let surface = transform::placeholder(spec)?;
    Ok(backend.encode(&surface, ImageFormat::Png, Quality::DEFAULT)?)
}

/// What `inspect` reports about an encoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    /// Any pixel not fully opaque.
    pub has_alpha: bool,
}

pub fn inspect(backend: &impl ImageBackend, file: &EncodedBlob) -> Result<ImageInfo> {
    let surface = backend.decode(file)?;
    let format = file
        .image_format()
        .ok_or_else(|| BackendError::Decode("unrecognized image data".to_string()))?;
    Ok(ImageInfo {
        format,
        mime_type: format.mime_type(),
        width: surface.width(),
        height: surface.height(),
        bytes: file.len(),
        has_alpha: surface.has_transparency(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{garbage_blob, mock_jpeg, mock_png, solid_surface};

    fn only_encode(backend: &MockBackend) -> RecordedOp {
        let encodes = backend.encodes();
        assert_eq!(encodes.len(), 1, "expected exactly one encode: {encodes:?}");
        encodes[0].clone()
    }

    #[test]
    fn convert_uses_target_and_default_quality() {
        let backend = MockBackend::new();
        let out = convert_one(&backend, &mock_png(10), ImageFormat::WebP, None).unwrap();
        assert_eq!(out.image_format(), Some(ImageFormat::WebP));
        assert!(matches!(
            only_encode(&backend),
            RecordedOp::Encode {
                format: ImageFormat::WebP,
                quality: 92,
                ..
            }
        ));
    }

    #[test]
    fn convert_honors_explicit_quality() {
        let backend = MockBackend::new();
        convert_one(&backend, &mock_png(10), ImageFormat::Jpeg, Some(Quality::new(0.5))).unwrap();
        assert!(matches!(
            only_encode(&backend),
            RecordedOp::Encode { quality: 50, .. }
        ));
    }

    #[test]
    fn convert_to_unencodable_format_fails() {
        let backend = MockBackend::new();
        let err = convert_one(&backend, &mock_png(10), ImageFormat::Gif, None).unwrap_err();
        assert!(matches!(
            err,
            OperationError::Backend(BackendError::UnsupportedFormat(ImageFormat::Gif))
        ));
    }

    #[test]
    fn edits_keep_source_format() {
        let backend = MockBackend::new();
        let out = grayscale(&backend, &mock_jpeg(10)).unwrap();
        assert_eq!(out.image_format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn edits_fall_back_to_png_for_unencodable_sources() {
        let backend = MockBackend::new();
        let gif = EncodedBlob::image(ImageFormat::Gif, vec![0; 4]);
        let out = rotate(&backend, &gif, 90.0).unwrap();
        assert_eq!(out.image_format(), Some(ImageFormat::Png));
    }

    #[test]
    fn resize_encodes_requested_dimensions() {
        let backend = MockBackend::new();
        resize(&backend, &mock_png(10), 3, 5).unwrap();
        assert!(matches!(
            only_encode(&backend),
            RecordedOp::Encode {
                width: 3,
                height: 5,
                ..
            }
        ));
    }

    #[test]
    fn invalid_geometry_is_a_transform_error() {
        let backend = MockBackend::new();
        let err = resize(&backend, &mock_png(10), 0, 5).unwrap_err();
        assert!(matches!(err, OperationError::Transform(_)));
        assert!(backend.encodes().is_empty());

        let err = adjust_hue(&backend, &mock_png(10), f64::NAN).unwrap_err();
        assert!(matches!(
            err,
            OperationError::Transform(TransformError::InvalidHueShift(_))
        ));
    }

    #[test]
    fn rotate_flip_saturation_run_through_backend() {
        let backend = MockBackend::with_surface(solid_surface(6, 2, [9, 9, 9, 255]));
        rotate(&backend, &mock_png(1), 90.0).unwrap();
        flip(&backend, &mock_png(1), FlipAxis::Vertical).unwrap();
        adjust_saturation(&backend, &mock_png(1), 1.5).unwrap();
        let dims: Vec<(u32, u32)> = backend
            .encodes()
            .into_iter()
            .map(|op| match op {
                RecordedOp::Encode { width, height, .. } => (width, height),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(dims, vec![(2, 6), (6, 2), (6, 2)]);
    }

    #[test]
    fn merge_outputs_png_of_stacked_size() {
        let backend = MockBackend::new();
        let out = merge(&backend, &[mock_jpeg(5), mock_png(5), mock_png(5)]).unwrap();
        assert_eq!(out.image_format(), Some(ImageFormat::Png));
        assert!(matches!(
            only_encode(&backend),
            RecordedOp::Encode {
                format: ImageFormat::Png,
                width: 8,
                height: 24,
                ..
            }
        ));
    }

    #[test]
    fn merge_of_nothing_fails() {
        let backend = MockBackend::new();
        assert!(matches!(
            merge(&backend, &[]).unwrap_err(),
            OperationError::Transform(TransformError::NothingToMerge)
        ));
    }

    #[test]
    fn merge_stops_at_first_bad_input() {
        let backend = MockBackend::new();
        let err = merge(&backend, &[mock_png(5), garbage_blob()]).unwrap_err();
        assert!(matches!(err, OperationError::Backend(BackendError::Decode(_))));
    }

    #[test]
    fn favicon_is_ico_at_requested_size() {
        let backend = MockBackend::new();
        let out = make_favicon(&backend, &mock_png(5), FaviconSize::Px48).unwrap();
        assert_eq!(out.image_format(), Some(ImageFormat::Ico));
        assert!(matches!(
            only_encode(&backend),
            RecordedOp::Encode {
                width: 48,
                height: 48,
                ..
            }
        ));
    }

    #[test]
    fn favicon_falls_back_to_png_without_ico_encoder() {
        let backend = MockBackend::new().without_encoder(ImageFormat::Ico);
        let out = make_favicon(&backend, &mock_png(5), FaviconSize::Px16).unwrap();
        assert_eq!(out.image_format(), Some(ImageFormat::Png));
    }

    #[test]
    fn placeholder_is_png_of_spec_size() {
        let backend = MockBackend::new();
        let spec = PlaceholderSpec {
            width: 320,
            height: 200,
            ..PlaceholderSpec::default()
        };
        let out = placeholder(&backend, &spec).unwrap();
        assert_eq!(out.image_format(), Some(ImageFormat::Png));
        assert!(matches!(
            only_encode(&backend),
            RecordedOp::Encode {
                width: 320,
                height: 200,
                ..
            }
        ));
    }

    #[test]
    fn inspect_reports_dimensions_and_alpha() {
        let backend = MockBackend::with_surface(solid_surface(5, 3, [0, 0, 0, 10]));
        let info = inspect(&backend, &mock_png(42)).unwrap();
        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!(info.mime_type, "image/png");
        assert_eq!((info.width, info.height, info.bytes), (5, 3, 42));
        assert!(info.has_alpha);
    }

    #[test]
    fn compress_one_returns_blob() {
        let backend = MockBackend::new().with_encode_sizes(&[3]);
        let out = compress_one(&backend, &mock_png(500), Quality::COMPRESS_DEFAULT).unwrap();
        assert_eq!(out.len(), 3);
    }
}
