//! Output filename derivation.
//!
//! Every output name is built the same way: take the base name of the
//! source (directories stripped), drop its last extension, append the
//! operation suffix, then append the extension of the format that was
//! *actually* produced:
//!
//! - `photo.png` + `_compressed` + JPEG → `photo_compressed.jpg`
//! - `scan.final.tiff` + `` + PNG → `scan.final.png`
//! - `.hidden` + `_resized` + PNG → `.hidden_resized.png`
//!
//! ## Archive Defaults
//!
//! When no output path is given the CLI falls back to fixed names:
//! `converted_images_<ext>.zip`, `compressed_images.zip`, `merged.png`,
//! `favicon.ico` (or `.png`) and `placeholder-<W>x<H>.png`.

use crate::imaging::ImageFormat;
use std::collections::HashSet;

pub const COMPRESSED_ARCHIVE: &str = "compressed_images.zip";
pub const MERGED_STEM: &str = "merged";
pub const FAVICON_STEM: &str = "favicon";

/// Name with any directory components removed. Both `/` and `\` separate.
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Everything before the last `.`; the full name when that would be empty.
///
/// `"a.b.png"` → `"a.b"`, `"README"` → `"README"`, `".env"` → `".env"`.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// `<stem><suffix>.<extension>` for a source file name.
pub fn output_name(source: &str, suffix: &str, extension: &str) -> String {
    format!("{}{suffix}.{extension}", file_stem(base_name(source)))
}

pub fn converted_archive_name(format: ImageFormat) -> String {
    format!("converted_images_{}.zip", format.extension())
}

pub fn placeholder_name(width: u32, height: u32) -> String {
    format!("placeholder-{width}x{height}.png")
}

/// Hands out unique names within one batch: a repeated `a.png` becomes
/// `a_2.png`, then `a_3.png`, and so on.
#[derive(Debug, Default)]
pub struct NameDeduper {
    seen: HashSet<String>,
}

impl NameDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, name: String) -> String {
        if self.seen.insert(name.clone()) {
            return name;
        }
        let stem = file_stem(&name);
        let extension = &name[stem.len()..];
        let mut n = 2;
        loop {
            let candidate = format!("{stem}_{n}{extension}");
            if self.seen.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
