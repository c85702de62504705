//! Shared test utilities for the rasterkit test suite.
//!
//! Provides fixture surfaces, real encoded blobs produced with
//! [`RustBackend`], and [`SourceFile`] builders for batch tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let surface = gradient_surface(32, 16);
//! let png = encode_fixture(&surface, ImageFormat::Png);
//! let files = vec![source("a.png", png.clone()), source("b.png", png)];
//! ```

use crate::batch::SourceFile;
use crate::imaging::{EncodedBlob, ImageBackend, ImageFormat, Quality, RustBackend, Surface};

// =========================================================================
// Surfaces
// =========================================================================

/// Opaque surface with a distinct color per pixel.
pub fn gradient_surface(width: u32, height: u32) -> Surface {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) * 7 % 256) as u8,
                255,
            ]);
        }
    }
    Surface::from_rgba(width, height, pixels).unwrap()
}

/// Alternating single-pixel cells of `a` and `b`.
pub fn checkerboard(width: u32, height: u32, a: [u8; 4], b: [u8; 4]) -> Surface {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let color = if (x + y) % 2 == 0 { a } else { b };
            pixels.extend_from_slice(&color);
        }
    }
    Surface::from_rgba(width, height, pixels).unwrap()
}

pub fn solid_surface(width: u32, height: u32, color: [u8; 4]) -> Surface {
    Surface::filled(width, height, color).unwrap()
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Encode with the production backend at default quality. Panics on failure.
pub fn encode_fixture(surface: &Surface, format: ImageFormat) -> EncodedBlob {
    RustBackend::new()
        .encode(surface, format, Quality::default())
        .unwrap_or_else(|e| panic!("fixture encode to {format} failed: {e}"))
}

/// A blob tagged as PNG that the mock backend accepts; content is irrelevant.
pub fn mock_png(len: usize) -> EncodedBlob {
    EncodedBlob::image(ImageFormat::Png, vec![0x89; len])
}

pub fn mock_jpeg(len: usize) -> EncodedBlob {
    EncodedBlob::image(ImageFormat::Jpeg, vec![0xFF; len])
}

pub fn garbage_blob() -> EncodedBlob {
    EncodedBlob::from_bytes(b"this is not an image".to_vec())
}

pub fn source(name: &str, blob: EncodedBlob) -> SourceFile {
    SourceFile::new(name, blob)
}
