//! Per-pixel color math: BT.601 luma, HSV conversion, alpha compositing.
//!
//! Channels are `u8` at the edges and `f32`/`f64` inside. Everything here is
//! a pure function of one pixel, which is what lets the transform engine run
//! it data-parallel.

use super::surface::Rgba;

/// ITU-R BT.601 luma weights.
pub const LUMA_R: f32 = 0.299;
pub const LUMA_G: f32 = 0.587;
pub const LUMA_B: f32 = 0.114;

/// Unrounded BT.601 luma of an RGB triple, in `0.0..=255.0`.
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32
}

/// Round and clamp a channel value into `u8`.
pub fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// RGB (0–255) to HSV with every component in `[0, 1]`; hue wraps at 1.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { delta / max };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    (h, s, max)
}

/// HSV (each in `[0, 1]`) back to RGB (0–255).
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let channel = |n: f64| {
        let value = hue_to_channel(n, h, s, v);
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    };
    (channel(5.0), channel(3.0), channel(1.0))
}

/// `f(n) = v − v·s·max(0, min(k, 4 − k, 1))` with `k = (n + 6h) mod 6`.
///
/// `n` selects the channel (5 = red, 3 = green, 1 = blue). Taking `k` modulo
/// 6 makes the result continuous across `h = 0` and `h → 1`.
pub fn hue_to_channel(n: f64, h: f64, s: f64, v: f64) -> f64 {
    let k = (n + h * 6.0).rem_euclid(6.0);
    v - v * s * k.min(4.0 - k).clamp(0.0, 1.0)
}

/// Rotate the hue of one RGB pixel by `turns` of a full circle.
pub fn shift_hue(r: u8, g: u8, b: u8, turns: f64) -> (u8, u8, u8) {
    let (h, s, v) = rgb_to_hsv(r, g, b);
    let shifted = (h + turns).rem_euclid(1.0);
    // rem_euclid may land on exactly 1.0 for tiny negative sums
    let shifted = if shifted >= 1.0 { 0.0 } else { shifted };
    hsv_to_rgb(shifted, s, v)
}

/// Source-over composite of `src` onto an opaque `background`.
pub fn composite_over(src: Rgba, background: Rgba) -> Rgba {
    let alpha = src[3] as f32 / 255.0;
    let mix = |s: u8, b: u8| to_channel(s as f32 * alpha + b as f32 * (1.0 - alpha));
    [
        mix(src[0], background[0]),
        mix(src[1], background[1]),
        mix(src[2], background[2]),
        255,
    ]
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
pub fn parse_hex_color(input: &str) -> Option<Rgba> {
    let hex = input.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgba = [255; 4];
            for (i, c) in hex.chars().enumerate() {
                let nibble = c.to_digit(16)? as u8;
                rgba[i] = nibble * 17;
            }
            Some(rgba)
        }
        6 => Some([byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255]),
        8 => Some([
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        ]),
        _ => None,
    }
}
