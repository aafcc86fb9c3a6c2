//! # folder2pdf
//!
//! Turn folders of photos into PDFs: one PDF per folder, one image per page,
//! recursively across a directory tree.
//!
//! ## Pipeline Overview
//!
//! ```text
//! folder
//!  │
//!  ├─ 1. Input      normalise the path (quotes, ~) and check it is a directory
//!  ├─ 2. Classify   pick direct entries with an image extension
//!  ├─ 3. Normalize  bridge HEIC to PNG (or skip it without a decoder)
//!  ├─ 4. Recurse    subdirectories convert on their own first
//!  ├─ 5. Compose    sorted images, scaled to fit and centred, one per page
//!  └─ 6. Cleanup    delete bridge PNGs and originals, only if asked
//! ```
//!
//! Each folder that directly holds at least one image gets
//! `<folder name>.pdf` written inside it. Existing PDFs of that name are
//! replaced; reruns are idempotent.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use folder2pdf::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default(); // keeps originals
//!     let summary = convert("~/Pictures/2024", &config)?;
//!     for pdf in summary.pdfs() {
//!         println!("{}", pdf.display());
//!     }
//!     eprintln!("{} PDFs, {} failed folders", summary.pdf_count(), summary.failed_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `folder2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `heic`  | off     | HEIC decoding through libheif (needs the system library) |
//!
//! Without `heic`, HEIC files are skipped and reported rather than failing
//! the run, unless a decoder is supplied through
//! [`ConversionConfigBuilder::heic_decoder`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSize};
pub use convert::{convert, convert_folder, convert_path, inspect, inspect_path, pdf_path_for};
pub use error::{Folder2PdfError, FolderError};
pub use output::{
    ConversionOutcome, ConversionSummary, DeletionFailure, FolderInventory, FolderReport,
    SkipReason, SkippedImage,
};
pub use pipeline::classify::{is_supported_image, SUPPORTED_EXTENSIONS};
pub use pipeline::normalize::HeicDecoder;
pub use progress::{ConversionProgressCallback, LineProgress, NoopProgressCallback, ProgressCallback};
