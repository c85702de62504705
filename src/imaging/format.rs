//! Image formats and encoded blobs.
//!
//! Formats are recognized from magic bytes, never from file names: a file
//! called `photo.png` that holds JPEG data is treated as a JPEG. File
//! extensions only matter when *naming* outputs.
//!
//! | Format | Alpha | Lossy encode | Canonical extension |
//! |---|---|---|---|
//! | JPEG | no | yes | `jpg` |
//! | PNG | yes | no | `png` |
//! | WebP | yes | no | `webp` |
//! | BMP | no | no | `bmp` |
//! | ICO | yes | no | `ico` |
//! | GIF | yes | no | `gif` |
//! | TIFF | yes | no | `tiff` |
//! | AVIF | yes | yes | `avif` |

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A raster image format the toolkit knows how to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Ico,
    Gif,
    Tiff,
    Avif,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown image format: {0}")]
pub struct UnknownFormat(pub String);

impl ImageFormat {
    pub const ALL: [ImageFormat; 8] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::WebP,
        ImageFormat::Bmp,
        ImageFormat::Ico,
        ImageFormat::Gif,
        ImageFormat::Tiff,
        ImageFormat::Avif,
    ];

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Ico => "image/x-icon",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Avif => "image/avif",
        }
    }

    /// Extension used when naming outputs of this format.
    pub fn extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// Every file extension accepted for this format, canonical first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Png => &["png"],
            ImageFormat::WebP => &["webp"],
            ImageFormat::Bmp => &["bmp"],
            ImageFormat::Ico => &["ico"],
            ImageFormat::Gif => &["gif"],
            ImageFormat::Tiff => &["tiff", "tif"],
            ImageFormat::Avif => &["avif"],
        }
    }

    /// Whether encoded files of this format can carry transparency.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, ImageFormat::Jpeg | ImageFormat::Bmp)
    }

    /// Whether the encoder for this format honors a quality setting.
    pub fn is_lossy(self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Avif)
    }

    /// Whether compression re-encodes this format in place instead of
    /// trying JPEG and a downscaled PNG.
    pub fn recompresses_in_place(self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Avif)
    }

    /// Look up a format by file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    /// Detect a format from the leading magic bytes of `data`.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }
        if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            return Some(ImageFormat::Ico);
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(ImageFormat::Tiff);
        }
        // ISO-BMFF: size(4) "ftyp" brand(4)
        if data.len() >= 12 && &data[4..8] == b"ftyp" && matches!(&data[8..12], b"avif" | b"avis")
        {
            return Some(ImageFormat::Avif);
        }
        None
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::WebP => "webp",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Ico => "ico",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Avif => "avif",
        };
        f.write_str(name)
    }
}

/// Parses `"jpeg"`, `"jpg"`, `".JPG"` or `"image/jpeg"` alike.
impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.to_ascii_lowercase();
        if let Some(format) = Self::ALL.into_iter().find(|f| f.mime_type() == normalized) {
            return Ok(format);
        }
        let name = normalized
            .strip_prefix("image/")
            .unwrap_or(&normalized)
            .trim_start_matches('.');
        Self::from_extension(name).ok_or_else(|| UnknownFormat(trimmed.to_string()))
    }
}

/// What an [`EncodedBlob`] contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobFormat {
    Image(ImageFormat),
    /// ZIP container produced for multi-file batches.
    Zip,
    /// Bytes that match no known signature.
    Unknown,
}

impl BlobFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            BlobFormat::Image(format) => format.mime_type(),
            BlobFormat::Zip => "application/zip",
            BlobFormat::Unknown => "application/octet-stream",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            BlobFormat::Image(format) => format.extension(),
            BlobFormat::Zip => "zip",
            BlobFormat::Unknown => "bin",
        }
    }
}

/// Immutable encoded bytes tagged with their format.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedBlob {
    format: BlobFormat,
    bytes: Vec<u8>,
}

impl EncodedBlob {
    pub fn new(format: BlobFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn image(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self::new(BlobFormat::Image(format), bytes)
    }

    /// Wrap caller-provided bytes, tagging them by their magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let format = if let Some(image) = ImageFormat::sniff(&bytes) {
            BlobFormat::Image(image)
        } else if bytes.starts_with(b"PK\x03\x04") {
            BlobFormat::Zip
        } else {
            BlobFormat::Unknown
        };
        Self { format, bytes }
    }

    pub fn format(&self) -> BlobFormat {
        self.format
    }

    /// The image format, if this blob holds an image.
    pub fn image_format(&self) -> Option<ImageFormat> {
        match self.format {
            BlobFormat::Image(format) => Some(format),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Blobs can be megabytes; print the tag and size only.
impl fmt::Debug for EncodedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedBlob")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}
