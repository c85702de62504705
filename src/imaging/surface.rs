//! Decoded pixel surfaces.
//!
//! A [`Surface`] is the only pixel representation the transform engine sees:
//! tightly packed RGBA8, straight (non-premultiplied) alpha, rows top to
//! bottom. Every constructor checks that the buffer holds exactly
//! `width * height * 4` bytes and that neither dimension is zero, so code
//! downstream can index without re-validating.

use super::calculations::rgba_buffer_len;
use super::transform::TransformError;
use image::RgbaImage;
use std::fmt;

/// One RGBA8 pixel.
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// Wrap an RGBA8 buffer, rejecting mismatched lengths.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TransformError> {
        let expected = checked_len(width, height)?;
        if pixels.len() != expected {
            return Err(TransformError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A surface where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Result<Self, TransformError> {
        let len = checked_len(width, height)?;
        let mut pixels = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            pixels.extend_from_slice(&color);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_rgba_image(img: RgbaImage) -> Result<Self, TransformError> {
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }

    /// Copy into an `image` crate buffer for codec and resampling calls.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .expect("surface buffer length matches its dimensions")
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub(crate) fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&color);
    }

    /// True when any pixel is not fully opaque.
    pub fn has_transparency(&self) -> bool {
        self.pixels.chunks_exact(4).any(|px| px[3] != 255)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} surface",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * 4
    }
}

fn checked_len(width: u32, height: u32) -> Result<usize, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidDimensions { width, height });
    }
    rgba_buffer_len(width, height).ok_or(TransformError::CanvasTooLarge { width, height })
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Surface({}x{})", self.width, self.height)
    }
}
