//! Pure calculation functions for canvas geometry.
//!
//! All functions here are pure and testable without any pixels or codecs.

/// Tolerance for snapping floating-point canvas sizes before rounding up.
const CANVAS_EPSILON: f64 = 1e-6;

/// Byte length of an RGBA8 buffer, or `None` if it would overflow `usize`.
pub fn rgba_buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)
}

/// Normalize an angle in degrees into `[0, 360)`.
///
/// # Examples
/// ```
/// # use rasterkit::imaging::calculations::normalize_degrees;
/// assert_eq!(normalize_degrees(-90.0), 270.0);
/// assert_eq!(normalize_degrees(720.0), 0.0);
/// ```
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Exact quarter-turn count for angles that are multiples of 90°.
///
/// Returns `Some(0..=3)` for 0°, 90°, 180°, 270° (after normalization),
/// `None` for any other angle.
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    let d = normalize_degrees(degrees);
    let turns = d / 90.0;
    let rounded = turns.round();
    if (turns - rounded).abs() < 1e-9 {
        Some((rounded as u8) % 4)
    } else {
        None
    }
}

/// `(sin θ, cos θ)` for an angle in degrees, exact at quarter turns.
pub fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    match quarter_turns(degrees) {
        Some(0) => (0.0, 1.0),
        Some(1) => (1.0, 0.0),
        Some(2) => (0.0, -1.0),
        Some(3) => (-1.0, 0.0),
        _ => normalize_degrees(degrees).to_radians().sin_cos(),
    }
}

/// Bounding box of a `width × height` rectangle rotated by `degrees`.
///
/// `newW = |W·cos θ| + |H·sin θ|`, `newH = |W·sin θ| + |H·cos θ|`, rounded up
/// to whole pixels (never below 1).
///
/// # Examples
/// ```
/// # use rasterkit::imaging::calculations::rotated_bounds;
/// assert_eq!(rotated_bounds(100, 50, 90.0), (50, 100));
/// assert_eq!(rotated_bounds(100, 50, 360.0), (100, 50));
/// ```
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (sin, cos) = sin_cos_degrees(degrees);
    let (w, h) = (width as f64, height as f64);
    let new_w = (w * cos).abs() + (h * sin).abs();
    let new_h = (w * sin).abs() + (h * cos).abs();
    (ceil_pixels(new_w), ceil_pixels(new_h))
}

fn ceil_pixels(value: f64) -> u32 {
    ((value - CANVAS_EPSILON).ceil().max(1.0)).min(u32::MAX as f64) as u32
}

/// Dimensions after scaling by `sqrt(quality)` on both axes.
///
/// Used by the PNG downscale step of compression: quality 0.81 shrinks each
/// edge to 90%, which removes ~19% of the pixels.
pub fn quality_scaled_dimensions(width: u32, height: u32, quality: f32) -> (u32, u32) {
    let scale = (quality.clamp(0.0, 1.0) as f64).sqrt();
    let w = ((width as f64) * scale).round().max(1.0) as u32;
    let h = ((height as f64) * scale).round().max(1.0) as u32;
    (w, h)
}

/// Canvas for a vertical stack: max width, summed height.
///
/// Returns `None` for an empty list or when the total height overflows `u32`.
pub fn stacked_canvas(sizes: &[(u32, u32)]) -> Option<(u32, u32)> {
    let width = sizes.iter().map(|&(w, _)| w).max()?;
    let height = sizes
        .iter()
        .try_fold(0u32, |acc, &(_, h)| acc.checked_add(h))?;
    Some((width, height))
}

/// Integer scale for 8×8 bitmap glyphs on a `width × height` canvas.
///
/// Targets a glyph height of `min(width, height) / 10`, never below 1×.
pub fn glyph_scale(width: u32, height: u32) -> u32 {
    (width.min(height) / 10 / 8).max(1)
}
