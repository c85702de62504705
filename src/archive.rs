//! Packing named blobs into one ZIP container.
//!
//! The [`Archiver`] trait keeps the batch coordinator independent of the
//! container codec; [`ZipArchiver`] is the production implementation and
//! writes Deflate entries into an in-memory buffer, in the order given.

use crate::batch::NamedBlob;
use crate::imaging::{BlobFormat, EncodedBlob};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use thiserror::Error;
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Duplicate archive entry: {0}")]
    DuplicateName(String),
}

pub trait Archiver: Sync {
    /// Bundle `entries` into one container blob. Entry names must be unique.
    fn archive(&self, entries: &[NamedBlob]) -> Result<EncodedBlob, ArchiveError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub fn new() -> Self {
        Self
    }
}

impl Archiver for ZipArchiver {
    fn archive(&self, entries: &[NamedBlob]) -> Result<EncodedBlob, ArchiveError> {
        let mut names = HashSet::new();
        if let Some(dup) = entries.iter().find(|e| !names.insert(e.filename.as_str())) {
            return Err(ArchiveError::DuplicateName(dup.filename.clone()));
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in entries {
            writer.start_file(entry.filename.as_str(), options)?;
            writer.write_all(entry.blob.bytes())?;
        }
        let bytes = writer.finish()?.into_inner();
        debug!(entries = entries.len(), bytes = bytes.len(), "archived");
        Ok(EncodedBlob::new(BlobFormat::Zip, bytes))
    }
}
