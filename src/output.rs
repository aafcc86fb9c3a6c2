//! Result types returned by [`crate::convert`] and [`crate::inspect`].
//!
//! A run produces one [`FolderReport`] per visited directory, in the order
//! the directories finished (children before parents). The
//! [`ConversionSummary`] aggregates them for caller-facing reporting.

use crate::error::FolderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What happened to one directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// A PDF was written with one page per image, in page order.
    Written { pdf_path: PathBuf, pages: Vec<PathBuf> },
    /// The directory had no usable images; no PDF was produced.
    NoImages,
    /// The directory's PDF could not be produced.
    Failed { error: FolderError },
}

/// Why a candidate image was left out of its folder's PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// HEIC source with no decoder compiled in.
    HeicUnsupported,
    /// The source could not be decoded during normalisation.
    DecodeFailed(String),
    /// The source decoded but its PNG bridge could not be written.
    BridgeFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::HeicUnsupported => f.write_str("HEIC decoding is not available"),
            SkipReason::DecodeFailed(detail) => write!(f, "could not be decoded: {detail}"),
            SkipReason::BridgeFailed(detail) => write!(f, "PNG bridge not written: {detail}"),
        }
    }
}

/// A candidate image that did not make it into the PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// A file that could not be removed during cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionFailure {
    pub path: PathBuf,
    pub detail: String,
}

/// Everything that happened in one directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderReport {
    pub folder: PathBuf,
    pub outcome: ConversionOutcome,
    /// Candidates dropped during normalisation.
    pub skipped: Vec<SkippedImage>,
    /// Files removed by cleanup (bridge files and originals).
    pub deleted: Vec<PathBuf>,
    /// Files cleanup could not remove.
    pub deletion_failures: Vec<DeletionFailure>,
}

impl FolderReport {
    pub(crate) fn new(folder: PathBuf, outcome: ConversionOutcome) -> Self {
        Self {
            folder,
            outcome,
            skipped: Vec::new(),
            deleted: Vec::new(),
            deletion_failures: Vec::new(),
        }
    }

    /// Path of the PDF this folder produced, if any.
    pub fn pdf_path(&self) -> Option<&PathBuf> {
        match &self.outcome {
            ConversionOutcome::Written { pdf_path, .. } => Some(pdf_path),
            _ => None,
        }
    }

    /// Number of pages in this folder's PDF (0 when none was written).
    pub fn page_count(&self) -> usize {
        match &self.outcome {
            ConversionOutcome::Written { pages, .. } => pages.len(),
            _ => 0,
        }
    }
}

/// The aggregated result of converting a directory tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionSummary {
    /// The top-level folder, after path normalisation.
    pub root: PathBuf,
    /// Whether originals were kept.
    pub preserve_originals: bool,
    /// One report per visited directory, children before parents.
    pub folders: Vec<FolderReport>,
    /// Wall-clock time for the whole run.
    pub duration_ms: u64,
}

impl ConversionSummary {
    /// Number of PDFs produced across the tree.
    pub fn pdf_count(&self) -> usize {
        self.folders.iter().filter(|f| f.pdf_path().is_some()).count()
    }

    /// Paths of every PDF produced, in completion order.
    pub fn pdfs(&self) -> Vec<&PathBuf> {
        self.folders.iter().filter_map(FolderReport::pdf_path).collect()
    }

    /// Total pages across all produced PDFs.
    pub fn page_count(&self) -> usize {
        self.folders.iter().map(FolderReport::page_count).sum()
    }

    /// Directories whose PDF could not be produced.
    pub fn failed(&self) -> impl Iterator<Item = &FolderReport> {
        self.folders
            .iter()
            .filter(|f| matches!(f.outcome, ConversionOutcome::Failed { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Candidate images left out of their PDFs.
    pub fn skipped_count(&self) -> usize {
        self.folders.iter().map(|f| f.skipped.len()).sum()
    }

    /// Files removed by cleanup.
    pub fn deleted_count(&self) -> usize {
        self.folders.iter().map(|f| f.deleted.len()).sum()
    }

    /// Files cleanup could not remove.
    pub fn deletion_failure_count(&self) -> usize {
        self.folders.iter().map(|f| f.deletion_failures.len()).sum()
    }

    /// Look up the report for a directory.
    pub fn folder(&self, path: impl AsRef<std::path::Path>) -> Option<&FolderReport> {
        let path = path.as_ref();
        self.folders.iter().find(|f| f.folder == path)
    }
}

/// A read-only look at a tree: what a conversion would pick up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderInventory {
    pub root: PathBuf,
    /// Supported images anywhere under the root.
    pub image_count: usize,
    /// How many of those are HEIC.
    pub heic_count: usize,
    /// Directories with at least one direct image, i.e. those that would
    /// receive a PDF (assuming their images decode).
    pub folders_with_images: Vec<PathBuf>,
    /// Every directory visited, including the root.
    pub folder_count: usize,
}
