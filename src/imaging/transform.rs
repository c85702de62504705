//! Pure pixel transforms on [`Surface`]s.
//!
//! Nothing in this module knows about encoded formats or the backend: every
//! function takes a surface (or a list of them) plus parameters and returns
//! a freshly allocated surface. Geometry parameters are validated and never
//! silently clamped; color parameters clamp where the math has a natural
//! floor (negative saturation behaves like zero).
//!
//! Per-pixel color work (grayscale, saturation, hue, flatten) and the
//! arbitrary-angle rotation fan out over the rayon pool in row or pixel
//! chunks that never overlap.

use super::calculations::{
    glyph_scale, normalize_degrees, quarter_turns, rotated_bounds, sin_cos_degrees,
    stacked_canvas,
};
use super::color::{composite_over, luma, shift_hue, to_channel};
use super::params::{FlipAxis, PlaceholderSpec, TransformRequest};
use super::surface::{Rgba, Surface, TRANSPARENT, WHITE};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::imageops::{self, FilterType};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("invalid dimensions {width}x{height}: both must be greater than zero")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("canvas {width}x{height} is too large to allocate")]
    CanvasTooLarge { width: u32, height: u32 },
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("rotation angle must be finite, got {0}")]
    InvalidAngle(f64),
    #[error("saturation factor must be finite, got {0}")]
    InvalidSaturation(f32),
    #[error("hue shift must be finite, got {0}")]
    InvalidHueShift(f64),
    #[error("merge needs at least one image")]
    NothingToMerge,
}

pub type Result<T> = std::result::Result<T, TransformError>;

/// Dispatch a [`TransformRequest`] to the matching transform.
pub fn apply(surface: &Surface, request: &TransformRequest) -> Result<Surface> {
    match *request {
        TransformRequest::Resize { width, height } => resize(surface, width, height),
        TransformRequest::Rotate { degrees } => rotate(surface, degrees),
        TransformRequest::Flip(axis) => Ok(flip(surface, axis)),
        TransformRequest::Grayscale => Ok(grayscale(surface)),
        TransformRequest::Saturation { factor } => adjust_saturation(surface, factor),
        TransformRequest::Hue { degrees } => adjust_hue(surface, degrees),
    }
}

/// Resample to exactly `width × height` with Catmull-Rom (bicubic).
pub fn resize(surface: &Surface, width: u32, height: u32) -> Result<Surface> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidDimensions { width, height });
    }
    if surface.dimensions() == (width, height) {
        return Ok(surface.clone());
    }
    let resized = imageops::resize(
        &surface.to_rgba_image(),
        width,
        height,
        FilterType::CatmullRom,
    );
    Surface::from_rgba_image(resized)
}

/// Rotate clockwise by `degrees`, growing the canvas to the rotated bounds.
///
/// Multiples of 90° are exact pixel remaps. Any other angle samples the
/// source bilinearly (premultiplied) about the image center; canvas pixels
/// that map outside the source are transparent.
pub fn rotate(surface: &Surface, degrees: f64) -> Result<Surface> {
    if !degrees.is_finite() {
        return Err(TransformError::InvalidAngle(degrees));
    }
    if let Some(turns) = quarter_turns(degrees) {
        return Ok(rotate_quarter(surface, turns));
    }

    let (w, h) = surface.dimensions();
    let (out_w, out_h) = rotated_bounds(w, h, degrees);
    let mut out = Surface::filled(out_w, out_h, TRANSPARENT)?;

    let (sin, cos) = sin_cos_degrees(degrees);
    let (src_cx, src_cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (dst_cx, dst_cy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);
    let row_bytes = out_w as usize * 4;

    out.pixels_mut()
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f64 + 0.5 - dst_cy;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let dx = x as f64 + 0.5 - dst_cx;
                // inverse of the clockwise rotation, y axis pointing down
                let sx = dx * cos + dy * sin + src_cx;
                let sy = -dx * sin + dy * cos + src_cy;
                px.copy_from_slice(&sample_bilinear(surface, sx - 0.5, sy - 0.5));
            }
        });
    Ok(out)
}

fn rotate_quarter(surface: &Surface, turns: u8) -> Surface {
    let (w, h) = surface.dimensions();
    if turns == 0 {
        return surface.clone();
    }
    let (out_w, out_h) = if turns == 2 { (w, h) } else { (h, w) };
    let mut pixels = Vec::with_capacity(surface.pixels().len());
    for y in 0..out_h {
        for x in 0..out_w {
            let (sx, sy) = match turns {
                1 => (y, h - 1 - x),
                2 => (w - 1 - x, h - 1 - y),
                _ => (w - 1 - y, x),
            };
            pixels.extend_from_slice(&surface.pixel(sx, sy));
        }
    }
    Surface::from_rgba(out_w, out_h, pixels).expect("quarter turn preserves pixel count")
}

/// Bilinear sample at continuous pixel coordinates `(u, v)` where integer
/// values hit pixel centers. Weights are applied to premultiplied color so
/// transparent neighbours do not darken edges.
fn sample_bilinear(src: &Surface, u: f64, v: f64) -> Rgba {
    let (w, h) = (src.width() as i64, src.height() as i64);
    let (x0, y0) = (u.floor(), v.floor());
    let (fx, fy) = (u - x0, v - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);
    if x0 < -1 || y0 < -1 || x0 >= w || y0 >= h {
        return TRANSPARENT;
    }

    let taps = [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ];
    let mut acc = [0.0f64; 4];
    for (ox, oy, weight) in taps {
        let (x, y) = (x0 + ox, y0 + oy);
        if weight <= 0.0 || x < 0 || y < 0 || x >= w || y >= h {
            continue;
        }
        let p = src.pixel(x as u32, y as u32);
        let a = p[3] as f64 * weight;
        acc[0] += p[0] as f64 * a;
        acc[1] += p[1] as f64 * a;
        acc[2] += p[2] as f64 * a;
        acc[3] += a;
    }
    if acc[3] <= 0.0 {
        return TRANSPARENT;
    }
    let unpremultiply = |c: f64| (c / acc[3]).round().clamp(0.0, 255.0) as u8;
    [
        unpremultiply(acc[0]),
        unpremultiply(acc[1]),
        unpremultiply(acc[2]),
        acc[3].round().clamp(0.0, 255.0) as u8,
    ]
}

/// Mirror along `axis`. Dimensions are unchanged.
pub fn flip(surface: &Surface, axis: FlipAxis) -> Surface {
    let (w, h) = surface.dimensions();
    let mut pixels = Vec::with_capacity(surface.pixels().len());
    for y in 0..h {
        for x in 0..w {
            let (sx, sy) = match axis {
                FlipAxis::Horizontal => (w - 1 - x, y),
                FlipAxis::Vertical => (x, h - 1 - y),
            };
            pixels.extend_from_slice(&surface.pixel(sx, sy));
        }
    }
    Surface::from_rgba(w, h, pixels).expect("flip preserves pixel count")
}

/// BT.601 luma into all three channels; alpha untouched.
pub fn grayscale(surface: &Surface) -> Surface {
    map_pixels(surface, |px| {
        let l = to_channel(luma(px[0], px[1], px[2]));
        [l, l, l, px[3]]
    })
}

/// Scale each channel's distance from the pixel's luma by `factor`.
pub fn adjust_saturation(surface: &Surface, factor: f32) -> Result<Surface> {
    if !factor.is_finite() {
        return Err(TransformError::InvalidSaturation(factor));
    }
    let factor = factor.max(0.0);
    Ok(map_pixels(surface, |px| {
        let l = luma(px[0], px[1], px[2]);
        let scale = |c: u8| to_channel(l + (c as f32 - l) * factor);
        [scale(px[0]), scale(px[1]), scale(px[2]), px[3]]
    }))
}

/// Rotate every pixel's hue by `degrees` (any finite value, wraps mod 360).
pub fn adjust_hue(surface: &Surface, degrees: f64) -> Result<Surface> {
    if !degrees.is_finite() {
        return Err(TransformError::InvalidHueShift(degrees));
    }
    let turns = normalize_degrees(degrees) / 360.0;
    Ok(map_pixels(surface, |px| {
        let (r, g, b) = shift_hue(px[0], px[1], px[2], turns);
        [r, g, b, px[3]]
    }))
}

/// Stack surfaces top to bottom, left-aligned, on an opaque white canvas.
pub fn merge(surfaces: &[Surface]) -> Result<Surface> {
    let sizes: Vec<(u32, u32)> = surfaces.iter().map(Surface::dimensions).collect();
    let (width, height) = match stacked_canvas(&sizes) {
        Some(canvas) => canvas,
        None if sizes.is_empty() => return Err(TransformError::NothingToMerge),
        None => {
            let width = sizes.iter().map(|s| s.0).max().unwrap_or(0);
            return Err(TransformError::CanvasTooLarge {
                width,
                height: u32::MAX,
            });
        }
    };

    let mut canvas = Surface::filled(width, height, WHITE)?;
    let mut offset = 0u32;
    for surface in surfaces {
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                let dst = canvas.pixel(x, offset + y);
                canvas.put_pixel(x, offset + y, composite_over(surface.pixel(x, y), dst));
            }
        }
        offset += surface.height();
    }
    Ok(canvas)
}

/// Composite onto an opaque `background`; every output pixel has alpha 255.
pub fn flatten(surface: &Surface, background: Rgba) -> Surface {
    map_pixels(surface, |px| composite_over(px, background))
}

pub fn solid(width: u32, height: u32, color: Rgba) -> Result<Surface> {
    Surface::filled(width, height, color)
}

/// Draw `text` centered in 8×8 bitmap glyphs scaled to about a tenth of
/// the shorter side. Characters without a glyph render as `?`; anything
/// outside the canvas is clipped.
pub fn draw_text(surface: &Surface, text: &str, color: Rgba) -> Surface {
    let mut out = surface.clone();
    let (w, h) = surface.dimensions();
    let scale = glyph_scale(w, h) as i64;
    let glyph_px = 8 * scale;
    let count = text.chars().count() as i64;
    let start_x = (w as i64 - count * glyph_px) / 2;
    let start_y = (h as i64 - glyph_px) / 2;

    for (i, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = start_x + i as i64 * glyph_px;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8 {
                if bits >> col & 1 == 0 {
                    continue;
                }
                let block_x = origin_x + col as i64 * scale;
                let block_y = start_y + row as i64 * scale;
                fill_block(&mut out, block_x, block_y, scale, color);
            }
        }
    }
    out
}

fn fill_block(surface: &mut Surface, x0: i64, y0: i64, size: i64, color: Rgba) {
    let (w, h) = (surface.width() as i64, surface.height() as i64);
    for y in y0.max(0)..(y0 + size).min(h) {
        for x in x0.max(0)..(x0 + size).min(w) {
            let (x, y) = (x as u32, y as u32);
            let dst = surface.pixel(x, y);
            let blended = if color[3] == 255 {
                color
            } else {
                composite_over(color, dst)
            };
            surface.put_pixel(x, y, blended);
        }
    }
}

/// Solid background with the label drawn on top.
pub fn placeholder(spec: &PlaceholderSpec) -> Result<Surface> {
    let background = solid(spec.width, spec.height, spec.background)?;
    if spec.text.is_empty() {
        return Ok(background);
    }
    Ok(draw_text(&background, &spec.text, spec.color))
}

fn map_pixels<F>(surface: &Surface, f: F) -> Surface
where
    F: Fn(Rgba) -> Rgba + Sync,
{
    let mut out = surface.clone();
    out.pixels_mut().par_chunks_exact_mut(4).for_each(|px| {
        let mapped = f([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&mapped);
    });
    out
}
