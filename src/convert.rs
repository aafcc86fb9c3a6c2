//! Folder conversion entry points.
//!
//! [`convert`] (or [`convert_path`]) validates the caller's path once, then walks the tree
//! depth-first. Every directory is its own [`DirectoryJob`]: it lists its
//! entries once, normalises its direct images, lets its subdirectories
//! finish, and only then builds its own PDF. A failure inside one job is
//! recorded in that job's [`FolderReport`] and never reaches its parent or
//! siblings.

use crate::config::ConversionConfig;
use crate::error::{Folder2PdfError, FolderError};
use crate::output::{ConversionOutcome, ConversionSummary, FolderInventory, FolderReport, SkippedImage};
use crate::pipeline::cleanup;
use crate::pipeline::compose::PdfComposer;
use crate::pipeline::normalize::{FormatNormalizer, Normalized};
use crate::pipeline::{classify, input};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// PDF name used when a folder has no final path component (`/`).
const FALLBACK_PDF_STEM: &str = "images";

/// Convert every folder under `folder` that directly holds images into
/// `<folder name>.pdf` inside that folder.
///
/// `folder` is a raw caller string: quotes, surrounding whitespace and a
/// leading `~` are handled by [`input::normalize_path`]. Use
/// [`convert_path`] for a path that must be taken as-is.
///
/// # Returns
/// `Ok(ConversionSummary)` once the whole tree has been visited, even if
/// some folders failed (check [`ConversionSummary::failed_count`]).
///
/// # Errors
/// Returns `Err(Folder2PdfError)` only for fatal errors, before anything
/// is written:
/// - folder not found / not a directory / permission denied
/// - invalid configuration
pub fn convert(
    folder: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionSummary, Folder2PdfError> {
    let start = Instant::now();
    config.validate()?;

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let root = input::resolve_folder(folder.as_ref())?;
    Ok(convert_root(root, config, start))
}

/// Like [`convert`], for a path that is already a [`Path`].
///
/// No quote stripping or `~` expansion is applied, and names that are not
/// valid UTF-8 are fine.
pub fn convert_path(
    folder: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionSummary, Folder2PdfError> {
    let start = Instant::now();
    config.validate()?;

    // ── Step 1: Validate input ───────────────────────────────────────────
    let root = input::validate_folder(folder.as_ref())?;
    Ok(convert_root(root, config, start))
}

fn convert_root(root: PathBuf, config: &ConversionConfig, start: Instant) -> ConversionSummary {
    info!(
        "Starting conversion: {} (preserve originals: {})",
        root.display(),
        config.preserve_originals
    );

    // ── Step 2: Walk the tree ────────────────────────────────────────────
    let folders = convert_folder(&root, config);

    // ── Step 3: Summarise ────────────────────────────────────────────────
    let summary = ConversionSummary {
        root,
        preserve_originals: config.preserve_originals,
        folders,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} PDFs, {} pages, {} failed folders, {}ms",
        summary.pdf_count(),
        summary.page_count(),
        summary.failed_count(),
        summary.duration_ms
    );
    progress(config).on_conversion_complete(summary.pdf_count());

    summary
}

/// Convert `folder` and everything below it, without validating the path
/// first.
///
/// Returns one report per visited directory, children before parents.
/// Never fails: an unreadable folder becomes a
/// [`ConversionOutcome::Failed`] report.
pub fn convert_folder(folder: &Path, config: &ConversionConfig) -> Vec<FolderReport> {
    let walker = Walker {
        config,
        normalizer: normalizer(config),
        progress: progress(config),
    };
    let mut reports = Vec::new();
    walker.visit(folder, &mut reports);
    reports
}

/// Count what a conversion of `folder` would pick up, without writing or
/// deleting anything.
pub fn inspect(folder: impl AsRef<str>) -> Result<FolderInventory, Folder2PdfError> {
    let root = input::resolve_folder(folder.as_ref())?;
    Ok(inspect_root(root))
}

/// Like [`inspect`], for a path taken as-is.
pub fn inspect_path(folder: impl AsRef<Path>) -> Result<FolderInventory, Folder2PdfError> {
    let root = input::validate_folder(folder.as_ref())?;
    Ok(inspect_root(root))
}

fn inspect_root(root: PathBuf) -> FolderInventory {
    let mut inventory = FolderInventory {
        root: root.clone(),
        ..Default::default()
    };

    let mut pending = vec![root];
    while let Some(dir) = pending.pop() {
        let listing = match Listing::read(&dir) {
            Ok(l) => l,
            Err(e) => {
                warn!("Cannot list {}: {}", dir.display(), e);
                continue;
            }
        };
        inventory.folder_count += 1;
        if !listing.images.is_empty() {
            inventory.folders_with_images.push(dir);
        }
        inventory.image_count += listing.images.len();
        inventory.heic_count += listing.images.iter().filter(|p| classify::is_heic(p)).count();
        // Reverse so the stack pops subdirectories in sorted order.
        pending.extend(listing.subdirs.into_iter().rev());
    }

    inventory.folders_with_images.sort();
    inventory
}

/// `<folder>/<folder name>.pdf`. The name is kept byte for byte.
pub fn pdf_path_for(folder: &Path) -> PathBuf {
    let mut name = folder
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| OsString::from(FALLBACK_PDF_STEM));
    name.push(".pdf");
    folder.join(name)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn normalizer(config: &ConversionConfig) -> FormatNormalizer {
    match config.heic_decoder {
        Some(decoder) if config.heic_supported => FormatNormalizer::with_decoder(decoder),
        _ => FormatNormalizer::new(config.heic_supported),
    }
}

fn progress(config: &ConversionConfig) -> &dyn ConversionProgressCallback {
    config
        .progress_callback
        .as_deref()
        .unwrap_or(&NoopProgressCallback)
}

/// One directory's immediate entries.
#[derive(Debug, Default)]
struct Listing {
    /// Supported images, in the order the file system returned them.
    images: Vec<PathBuf>,
    /// Real subdirectories, sorted. Symlinked directories are left out.
    subdirs: Vec<PathBuf>,
}

impl Listing {
    fn read(dir: &Path) -> std::io::Result<Self> {
        let mut listing = Self::default();
        for entry in std::fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            // `file_type` does not follow symlinks, `is_file` does.
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                listing.subdirs.push(path);
            } else if classify::is_supported_image_path(&path) && path.is_file() {
                listing.images.push(path);
            }
        }
        listing.subdirs.sort();
        Ok(listing)
    }
}

/// Per-directory unit of work. Owns its accumulators; nothing is shared
/// between directories.
struct DirectoryJob {
    folder: PathBuf,
    pdf_path: PathBuf,
    /// Embeddable images: originals and bridge PNGs.
    images: Vec<PathBuf>,
    /// Bridge PNGs synthesised for this folder.
    bridge_files: Vec<PathBuf>,
    skipped: Vec<SkippedImage>,
}

impl DirectoryJob {
    fn new(folder: &Path) -> Self {
        Self {
            folder: folder.to_path_buf(),
            pdf_path: pdf_path_for(folder),
            images: Vec::new(),
            bridge_files: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn normalize(
        &mut self,
        candidates: &[PathBuf],
        normalizer: &FormatNormalizer,
        progress: &dyn ConversionProgressCallback,
    ) {
        for candidate in candidates {
            match normalizer.normalize(candidate) {
                Normalized::Ready(path) => self.images.push(path),
                Normalized::Bridged { source, png } => {
                    progress.on_heic_converted(&source, &png);
                    self.images.push(png.clone());
                    self.bridge_files.push(png);
                }
                Normalized::Skipped { path, reason } => {
                    progress.on_file_skipped(&path, &reason);
                    self.skipped.push(SkippedImage { path, reason });
                }
            }
        }
    }

    /// Fix page order: lexicographic by path, each file once.
    fn sort_pages(&mut self) {
        self.images.sort();
        self.images.dedup();
    }

    fn build_pdf(
        &self,
        config: &ConversionConfig,
        progress: &dyn ConversionProgressCallback,
    ) -> Result<PathBuf, FolderError> {
        let mut composer = PdfComposer::new(&self.pdf_path, config.page_size);
        let total = self.images.len();
        for (i, image) in self.images.iter().enumerate() {
            composer.place_on_page(image)?;
            composer.show_page()?;
            progress.on_page_added(&self.pdf_path, i + 1, total, image);
        }
        composer.save()
    }

    fn into_report(self, outcome: ConversionOutcome) -> FolderReport {
        let mut report = FolderReport::new(self.folder, outcome);
        report.skipped = self.skipped;
        report
    }
}

struct Walker<'a> {
    config: &'a ConversionConfig,
    normalizer: FormatNormalizer,
    progress: &'a dyn ConversionProgressCallback,
}

impl Walker<'_> {
    fn visit(&self, folder: &Path, reports: &mut Vec<FolderReport>) {
        // ── Step 1: List entries once ────────────────────────────────────
        let listing = match Listing::read(folder) {
            Ok(listing) => listing,
            Err(e) => {
                let error = FolderError::ListFailed {
                    folder: folder.to_path_buf(),
                    detail: e.to_string(),
                };
                warn!("{}", error);
                self.progress.on_folder_failed(folder, &error.to_string());
                reports.push(FolderReport::new(
                    folder.to_path_buf(),
                    ConversionOutcome::Failed { error },
                ));
                return;
            }
        };

        info!("Processing images in folder: {}", folder.display());
        self.progress.on_folder_start(folder, listing.images.len());

        // ── Step 2: Normalise direct images ──────────────────────────────
        let mut job = DirectoryJob::new(folder);
        job.normalize(&listing.images, &self.normalizer, self.progress);

        // ── Step 3: Subdirectories first ─────────────────────────────────
        for subdir in &listing.subdirs {
            self.visit(subdir, reports);
        }

        // ── Step 4: Nothing to embed ─────────────────────────────────────
        if job.images.is_empty() {
            info!("No image files found in {}", folder.display());
            self.progress.on_no_images(folder);
            reports.push(job.into_report(ConversionOutcome::NoImages));
            return;
        }

        // ── Step 5: Build the PDF ────────────────────────────────────────
        job.sort_pages();
        debug!("{} pages for {}", job.images.len(), job.pdf_path.display());
        let pdf_path = match job.build_pdf(self.config, self.progress) {
            Ok(path) => path,
            Err(error) => {
                warn!("Failed to create PDF for {}: {}", folder.display(), error);
                self.progress.on_folder_failed(folder, &error.to_string());
                reports.push(job.into_report(ConversionOutcome::Failed { error }));
                return;
            }
        };
        info!("Finished creating: {}", pdf_path.display());
        self.progress.on_pdf_written(&pdf_path, job.images.len());

        // ── Step 6: Cleanup (opt-in) ─────────────────────────────────────
        let cleaned = if self.config.preserve_originals {
            cleanup::CleanupReport::default()
        } else {
            cleanup::purge_folder(folder, &job.bridge_files)
        };
        for path in &cleaned.deleted {
            self.progress.on_file_deleted(path);
        }
        for failure in &cleaned.failures {
            self.progress.on_deletion_failed(&failure.path, &failure.detail);
        }

        let pages = std::mem::take(&mut job.images);
        let mut report = job.into_report(ConversionOutcome::Written { pdf_path, pages });
        report.deleted = cleaned.deleted;
        report.deletion_failures = cleaned.failures;
        reports.push(report);
    }
}
