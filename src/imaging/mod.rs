//! Image processing — pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` after magic-byte sniffing |
//! | **Resize** | `image::imageops::resize` (Catmull-Rom) |
//! | **Rotate / flip / merge** | hand-written remaps and bilinear sampling |
//! | **Grayscale / saturation / hue** | per-pixel math fanned out with `rayon` |
//! | **Text** | `font8x8` bitmap glyphs |
//! | **Encode** | `image::codecs::{jpeg, png, webp, bmp, ico, avif}` |
//!
//! The module is split into:
//! - **Format**: [`ImageFormat`], [`EncodedBlob`], magic-byte detection
//! - **Surface**: the validated RGBA8 pixel buffer every transform works on
//! - **Calculations / color**: pure math (unit testable, no pixels)
//! - **Parameters**: data structures describing what to do
//! - **Transform**: pure surface → surface functions
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Compress**: the bounded compression search
//! - **Operations**: decode → transform → encode for one file

pub mod backend;
pub mod calculations;
pub mod color;
pub mod compress;
pub mod format;
pub mod operations;
mod params;
pub mod rust_backend;
mod surface;
pub mod transform;

pub use backend::{BackendError, ImageBackend};
pub use compress::{Compressed, CompressionStrategy};
pub use format::{BlobFormat, EncodedBlob, ImageFormat, UnknownFormat};
pub use operations::{ImageInfo, OperationError};
pub use params::{FaviconSize, FlipAxis, PlaceholderSpec, Quality, TransformRequest};
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use surface::{Rgba, Surface, TRANSPARENT, WHITE};
pub use transform::TransformError;
