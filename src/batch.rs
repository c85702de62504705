//! Batch processing: one operation fanned out over many files.
//!
//! Files are processed strictly in order, one at a time, so at most one
//! decoded surface is alive. The first failure aborts the whole batch and
//! names the offending file; nothing is archived in that case.
//!
//! ```text
//! files ──► for each: decode → operation → encode ──► NamedBlob
//!                                                      │
//!                      N == 1 ─────────────────────────┴──► BatchResult::Single
//!                      N  > 1 ──► Archiver ──────────────► BatchResult::Archive
//! ```
//!
//! ## Progress and Cancellation
//!
//! Callers can pass an `mpsc::Sender<BatchEvent>` to receive per-item
//! progress, and an `AtomicBool` that is checked before every item. A set
//! flag stops the batch with [`BatchError::Cancelled`]; since nothing is
//! written anywhere, there is nothing to roll back.

use crate::archive::{ArchiveError, Archiver};
use crate::imaging::operations::{self, OperationError};
use crate::imaging::{EncodedBlob, ImageBackend, ImageFormat, Quality, TransformRequest};
use crate::naming::{NameDeduper, output_name};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::debug;

/// A caller-provided input: original file name plus its bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub blob: EncodedBlob,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, blob: EncodedBlob) -> Self {
        Self {
            name: name.into(),
            blob,
        }
    }
}

/// One output of a batch, named after its source.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedBlob {
    pub filename: String,
    pub blob: EncodedBlob,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    Convert {
        format: ImageFormat,
        quality: Option<Quality>,
    },
    Compress {
        quality: Quality,
    },
    Edit(TransformRequest),
}

impl BatchOperation {
    /// Filename suffix appended to each output stem.
    pub fn suffix(&self) -> &'static str {
        match self {
            BatchOperation::Convert { .. } => "",
            BatchOperation::Compress { .. } => "_compressed",
            BatchOperation::Edit(request) => request.suffix(),
        }
    }
}

#[derive(Debug)]
pub enum BatchResult {
    /// Exactly one input: the encoded image itself.
    Single(NamedBlob),
    /// Several inputs: one ZIP holding every output, entry names in order.
    Archive {
        blob: EncodedBlob,
        entries: Vec<String>,
    },
}

impl BatchResult {
    pub fn blob(&self) -> &EncodedBlob {
        match self {
            BatchResult::Single(item) => &item.blob,
            BatchResult::Archive { blob, .. } => blob,
        }
    }
}

/// Progress events sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        index: usize,
        total: usize,
        name: String,
    },
    Finished {
        index: usize,
        filename: String,
        input_bytes: usize,
        output_bytes: usize,
    },
    Archived {
        entries: usize,
        bytes: usize,
    },
}

#[derive(Debug, Default)]
pub struct BatchOptions<'a> {
    pub events: Option<Sender<BatchEvent>>,
    pub cancel: Option<&'a AtomicBool>,
    /// Encode quality for [`BatchOperation::Edit`].
    pub edit_quality: Quality,
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No input files")]
    Empty,
    #[error("Failed on file {} ({filename}): {source}", .index + 1)]
    Item {
        /// Zero-based position in the input list.
        index: usize,
        filename: String,
        #[source]
        source: OperationError,
    },
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Batch cancelled")]
    Cancelled,
}

/// Run `operation` over `files`. See the [module docs](self).
pub fn run_batch(
    backend: &impl ImageBackend,
    archiver: &impl Archiver,
    files: &[SourceFile],
    operation: &BatchOperation,
    options: &BatchOptions<'_>,
) -> Result<BatchResult, BatchError> {
    if files.is_empty() {
        return Err(BatchError::Empty);
    }
    let total = files.len();
    let mut names = NameDeduper::new();

    let outputs = files.iter().enumerate().try_fold(
        Vec::with_capacity(total),
        |mut done, (index, file)| {
            if options.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                debug!(index, "batch cancelled");
                return Err(BatchError::Cancelled);
            }
            emit(
                options,
                BatchEvent::Started {
                    index,
                    total,
                    name: file.name.clone(),
                },
            );

            let blob = process_one(backend, file, operation, options).map_err(|source| {
                BatchError::Item {
                    index,
                    filename: file.name.clone(),
                    source,
                }
            })?;
            let filename = names.unique(output_name(
                &file.name,
                operation.suffix(),
                blob.format().extension(),
            ));
            debug!(index, %filename, bytes = blob.len(), "batch item done");
            emit(
                options,
                BatchEvent::Finished {
                    index,
                    filename: filename.clone(),
                    input_bytes: file.blob.len(),
                    output_bytes: blob.len(),
                },
            );
            done.push(NamedBlob { filename, blob });
            Ok(done)
        },
    )?;

    let outputs = match <[NamedBlob; 1]>::try_from(outputs) {
        Ok([only]) => return Ok(BatchResult::Single(only)),
        Err(outputs) => outputs,
    };

    let blob = archiver.archive(&outputs)?;
    emit(
        options,
        BatchEvent::Archived {
            entries: outputs.len(),
            bytes: blob.len(),
        },
    );
    Ok(BatchResult::Archive {
        blob,
        entries: outputs.into_iter().map(|o| o.filename).collect(),
    })
}

fn process_one(
    backend: &impl ImageBackend,
    file: &SourceFile,
    operation: &BatchOperation,
    options: &BatchOptions<'_>,
) -> Result<EncodedBlob, OperationError> {
    match operation {
        BatchOperation::Convert { format, quality } => {
            operations::convert_one(backend, &file.blob, *format, *quality)
        }
        BatchOperation::Compress { quality } => {
            operations::compress_one(backend, &file.blob, *quality)
        }
        BatchOperation::Edit(request) => {
            operations::apply_with_quality(backend, &file.blob, request, options.edit_quality)
        }
    }
}

fn emit(options: &BatchOptions<'_>, event: BatchEvent) {
    if let Some(tx) = &options.events {
        tx.send(event).ok();
    }
}

/// Convert every file to `target`; one image back for one input, a ZIP otherwise.
pub fn convert_many(
    backend: &impl ImageBackend,
    archiver: &impl Archiver,
    files: &[SourceFile],
    target: ImageFormat,
    quality: Option<Quality>,
) -> Result<BatchResult, BatchError> {
    let operation = BatchOperation::Convert {
        format: target,
        quality,
    };
    run_batch(backend, archiver, files, &operation, &BatchOptions::default())
}

pub fn compress_many(
    backend: &impl ImageBackend,
    archiver: &impl Archiver,
    files: &[SourceFile],
    quality: Quality,
) -> Result<BatchResult, BatchError> {
    run_batch(
        backend,
        archiver,
        files,
        &BatchOperation::Compress { quality },
        &BatchOptions::default(),
    )
}
