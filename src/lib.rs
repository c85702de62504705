//! # rasterkit
//!
//! Convert, compress and edit raster images entirely in memory. Every
//! operation takes encoded bytes in and hands encoded bytes back; the CLI is
//! the only part that touches the filesystem.
//!
//! # Architecture
//!
//! ```text
//! bytes ─▶ sniff format ─▶ decode ─▶ Surface ─▶ transform ─▶ encode ─▶ bytes
//!                                                    │
//!                             batch: N files ────────┴──▶ one file or a ZIP
//! ```
//!
//! Decoding and encoding go through the [`imaging::ImageBackend`] trait so
//! the pipeline logic (compression search, batch naming, fail-fast) is tested
//! against a recording mock without running real codecs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Formats, the RGBA surface, pixel transforms, codecs, compression search |
//! | [`batch`] | Apply one operation to many files; one result or a ZIP archive |
//! | [`archive`] | [`archive::Archiver`] trait and the ZIP implementation |
//! | [`naming`] | Output filename derivation and de-duplication |
//! | [`config`] | `rasterkit.toml` loading over stock defaults, validation |
//! | [`output`] | CLI output formatting for progress, results and image info |
//!
//! # Design Decisions
//!
//! ## Content Sniffing Over Extensions
//!
//! The format of an input is read from its magic bytes. A `.png` that is
//! really a JPEG is treated as a JPEG, and output names always carry the
//! extension of the format actually written.
//!
//! ## Bounded Compression
//!
//! [`imaging::compress::compress`] tries at most three encodings and keeps
//! the first one smaller than the input. A lossless source may come back as
//! JPEG. When nothing helps, the best attempt is returned anyway, so callers
//! must tolerate a result larger than the input.
//!
//! ## Pure-Rust Codecs
//!
//! Everything runs on the `image` crate and its pure-Rust encoders, so the
//! binary has no system library dependencies.

pub mod archive;
pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
