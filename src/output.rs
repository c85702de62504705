//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Batch progress
//!
//! ```text
//! 001/003 photos/cat.png
//!     cat.webp: 48.2 KB → 31.0 KB (-36%)
//! 002/003 photos/dog.png
//!     dog.webp: 12.0 KB → 12.4 KB (+3%)
//! Archived 3 files (61.9 KB)
//! Wrote converted_images_webp.zip (61.9 KB)
//! ```
//!
//! ## Inspect
//!
//! ```text
//! photos/cat.png
//!     Format: png (image/png)
//!     Dimensions: 640x480
//!     Size: 48.2 KB
//!     Alpha: no
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>` or
//! `String`) for testability and a `print_*` wrapper that writes to stdout.
//! Format functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchResult};
use crate::imaging::{EncodedBlob, ImageInfo};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count: `512 B`, `1.5 KB`, `2.0 MB`.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Signed percentage change from `before` to `after`, e.g. `-36%`.
fn format_change(before: usize, after: usize) -> String {
    if before == 0 {
        return "n/a".to_string();
    }
    let pct = (after as f64 - before as f64) / before as f64 * 100.0;
    format!("{:+.0}%", pct)
}

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { index, total, name } => vec![format!(
            "{}/{} {}",
            format_index(index + 1),
            format_index(*total),
            name
        )],
        BatchEvent::Finished {
            filename,
            input_bytes,
            output_bytes,
            ..
        } => vec![format!(
            "    {}: {} \u{2192} {} ({})",
            filename,
            format_size(*input_bytes),
            format_size(*output_bytes),
            format_change(*input_bytes, *output_bytes)
        )],
        BatchEvent::Archived { entries, bytes } => {
            vec![format!("Archived {} files ({})", entries, format_size(*bytes))]
        }
    }
}

/// Confirmation line after writing a blob to disk.
pub fn format_written(path: &Path, blob: &EncodedBlob) -> String {
    format!("Wrote {} ({})", path.display(), format_size(blob.len()))
}

/// Summary of a finished batch written to `path`.
pub fn format_batch_result(result: &BatchResult, path: &Path) -> Vec<String> {
    let mut lines = vec![format_written(path, result.blob())];
    if let BatchResult::Archive { entries, .. } = result {
        for (i, name) in entries.iter().enumerate() {
            lines.push(format!("    {} {}", format_index(i + 1), name));
        }
    }
    lines
}

pub fn format_image_info(name: &str, info: &ImageInfo) -> Vec<String> {
    vec![
        name.to_string(),
        format!("    Format: {} ({})", info.format, info.mime_type),
        format!("    Dimensions: {}x{}", info.width, info.height),
        format!("    Size: {}", format_size(info.bytes)),
        format!("    Alpha: {}", if info.has_alpha { "yes" } else { "no" }),
    ]
}

pub fn print_batch_result(result: &BatchResult, path: &Path) {
    for line in format_batch_result(result, path) {
        println!("{}", line);
    }
}

pub fn print_image_info(name: &str, info: &ImageInfo) {
    for line in format_image_info(name, info) {
        println!("{}", line);
    }
}
