//! Image codec backend trait and shared error type.
//!
//! The [`ImageBackend`] trait is the only seam between encoded bytes and
//! pixels: `decode` turns an [`EncodedBlob`] into a [`Surface`], `encode`
//! goes the other way, and `can_encode` lets callers probe runtime support
//! before committing to a target format.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on top of the
//! `image` crate. Pixel math never goes through the backend; see
//! [`transform`](super::transform).

use super::format::{EncodedBlob, ImageFormat};
use super::params::Quality;
use super::surface::Surface;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encoding to {0} is not supported")]
    UnsupportedFormat(ImageFormat),
    #[error("Encoding to {format} failed: {message}")]
    Encode {
        format: ImageFormat,
        message: String,
    },
}

/// Trait for image codec backends.
///
/// Implementations must be `Sync` so a single backend can be shared across
/// threads by callers that parallelize over files.
pub trait ImageBackend: Sync {
    /// Decode an encoded image into straight-alpha RGBA8.
    fn decode(&self, blob: &EncodedBlob) -> Result<Surface, BackendError>;

    /// Encode a surface as `format`. `quality` only affects lossy formats.
    fn encode(
        &self,
        surface: &Surface,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<EncodedBlob, BackendError>;

    /// Whether [`encode`](Self::encode) supports `format` at runtime.
    fn can_encode(&self, format: ImageFormat) -> bool;
}
