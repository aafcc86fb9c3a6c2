//! Error types for the folder2pdf library.
//!
//! Two distinct error types reflect two distinct blast radii:
//!
//! * [`Folder2PdfError`] (**fatal**): the run cannot start at all (the
//!   folder does not exist, is not a directory, cannot be listed, or the
//!   configuration is invalid). Returned as `Err(Folder2PdfError)` from
//!   [`crate::convert`] and [`crate::inspect`].
//!
//! * [`FolderError`] (**directory-local**): one directory's PDF could not
//!   be produced (an image became unreadable during composition, the PDF
//!   could not be written). Stored inside [`crate::output::FolderReport`]
//!   so sibling directories keep converting and the caller still sees
//!   what went wrong where.
//!
//! Per-file issues (a HEIC file without a decoder, an image that fails to
//! load during normalisation, a file that cannot be deleted) are not
//! errors at all: they are recorded in the report and emitted through the
//! progress callback.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the folder2pdf library.
#[derive(Debug, Error)]
pub enum Folder2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The folder was not found at the given path.
    #[error("Folder not found: '{path}'\nCheck the path exists and has no stray quotes or spaces.")]
    FolderNotFound { path: PathBuf },

    /// The path exists but is a file (or something else), not a directory.
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Process does not have permission to read the folder.
    #[error("Permission denied reading '{path}'\nTry: chmod +rx {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The top-level folder exists but could not be listed.
    #[error("Failed to read folder '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A failure that cancels one directory's PDF and nothing else.
///
/// Stored as [`crate::output::ConversionOutcome::Failed`]. Subdirectories
/// have already been processed by the time the parent's PDF is built, so a
/// `FolderError` never hides work done below it.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum FolderError {
    /// A subdirectory could not be listed.
    #[error("Failed to list folder '{folder}': {detail}")]
    ListFailed { folder: PathBuf, detail: String },

    /// An image passed classification and normalisation but could not be
    /// decoded while drawing its page.
    #[error("Error loading image '{path}': {detail}")]
    ImageLoadFailed { path: PathBuf, detail: String },

    /// The PDF object graph could not be assembled.
    #[error("Failed to build PDF '{path}': {detail}")]
    PdfBuildFailed { path: PathBuf, detail: String },

    /// The finished PDF could not be written to disk.
    #[error("Failed to write PDF '{path}': {detail}")]
    PdfWriteFailed { path: PathBuf, detail: String },
}
