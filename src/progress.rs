//! Progress-callback trait for per-folder conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the converter walks the tree.
//!
//! Callers that only want the human-readable status lines (a GUI log pane,
//! a terminal) wrap a closure in [`LineProgress`], which renders every event
//! as one line of text. Lines follow stable substring conventions such as
//! `"Processing images in folder: "` and `"Finished creating: "` so callers
//! may pattern-match on them.
//!
//! # Example
//!
//! ```rust
//! use folder2pdf::{ConversionConfig, ConversionProgressCallback, LineProgress};
//! use std::sync::Arc;
//!
//! let lines = LineProgress::new(|line: &str| eprintln!("{line}"));
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(lines) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::SkipReason;
use std::path::Path;
use std::sync::Arc;

/// Called by the converter as it processes each folder.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The converter is single-threaded, but the trait is
/// `Send + Sync` so one callback can be shared with a UI thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when a folder is entered, before any of its images are
    /// normalised.
    ///
    /// # Arguments
    /// * `folder`: the directory being processed
    /// * `candidates`: supported images found directly in it
    fn on_folder_start(&self, folder: &Path, candidates: usize) {
        let _ = (folder, candidates);
    }

    /// Called after a HEIC source was bridged to a PNG sibling.
    fn on_heic_converted(&self, source: &Path, png: &Path) {
        let _ = (source, png);
    }

    /// Called when a candidate image is left out of the PDF.
    ///
    /// # Arguments
    /// * `path`: the skipped file
    /// * `reason`: why it was left out (no decoder, decode error)
    fn on_file_skipped(&self, path: &Path, reason: &SkipReason) {
        let _ = (path, reason);
    }

    /// Called after an image has been drawn onto its page.
    ///
    /// # Arguments
    /// * `pdf`: the PDF being assembled
    /// * `page_num`: 1-indexed page number
    /// * `total`: pages this PDF will have
    /// * `image`: the image placed on this page
    fn on_page_added(&self, pdf: &Path, page_num: usize, total: usize, image: &Path) {
        let _ = (pdf, page_num, total, image);
    }

    /// Called once a folder's PDF has been saved.
    fn on_pdf_written(&self, pdf: &Path, pages: usize) {
        let _ = (pdf, pages);
    }

    /// Called when a folder has no usable images and gets no PDF.
    fn on_no_images(&self, folder: &Path) {
        let _ = folder;
    }

    /// Called when a folder's PDF could not be produced.
    fn on_folder_failed(&self, folder: &Path, error: &str) {
        let _ = (folder, error);
    }

    /// Called for every file removed during cleanup.
    fn on_file_deleted(&self, path: &Path) {
        let _ = path;
    }

    /// Called when a file could not be removed during cleanup.
    fn on_deletion_failed(&self, path: &Path, error: &str) {
        let _ = (path, error);
    }

    /// Called once after the whole tree has been processed.
    fn on_conversion_complete(&self, pdf_count: usize) {
        let _ = pdf_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

const BANNER: &str = "*****************************************";

/// Renders every progress event as a line of text and hands it to `sink`.
///
/// Per-file deletions are folded into a single `"Image files deleted."`
/// line emitted with [`ConversionProgressCallback::on_folder_start`] of the
/// next folder or at completion, matching the one-line-per-folder cleanup
/// report callers expect. Failed deletions are reported individually.
pub struct LineProgress<F>
where
    F: Fn(&str) + Send + Sync,
{
    sink: F,
    pending_deletions: std::sync::atomic::AtomicBool,
}

impl<F> LineProgress<F>
where
    F: Fn(&str) + Send + Sync,
{
    pub fn new(sink: F) -> Self {
        Self {
            sink,
            pending_deletions: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn emit(&self, line: &str) {
        (self.sink)(line);
    }

    fn flush_deletions(&self) {
        use std::sync::atomic::Ordering;
        if self.pending_deletions.swap(false, Ordering::SeqCst) {
            self.emit(BANNER);
            self.emit("Image files deleted.");
            self.emit(BANNER);
        }
    }
}

impl<F> ConversionProgressCallback for LineProgress<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn on_folder_start(&self, folder: &Path, _candidates: usize) {
        self.flush_deletions();
        self.emit(&format!("Processing images in folder: {}", folder.display()));
    }

    fn on_heic_converted(&self, source: &Path, png: &Path) {
        self.emit(&format!(
            "Converting .heic {} to {}",
            source.display(),
            png.display()
        ));
    }

    fn on_file_skipped(&self, path: &Path, reason: &SkipReason) {
        match reason {
            SkipReason::HeicUnsupported => {
                self.emit(&format!("Skipping HEIC file (no support): {}", path.display()))
            }
            SkipReason::DecodeFailed(detail) => {
                self.emit(&format!("Error loading image {}: {}", path.display(), detail))
            }
            SkipReason::BridgeFailed(detail) => {
                self.emit(&format!("Error converting {}: {}", path.display(), detail))
            }
        }
    }

    fn on_pdf_written(&self, pdf: &Path, _pages: usize) {
        self.flush_deletions();
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf.display().to_string());
        self.emit(BANNER);
        self.emit(&format!("Finished creating: {name}"));
        self.emit(BANNER);
    }

    fn on_no_images(&self, folder: &Path) {
        self.flush_deletions();
        self.emit(&format!("No image files found in {}", folder.display()));
    }

    fn on_folder_failed(&self, folder: &Path, error: &str) {
        self.flush_deletions();
        self.emit(&format!("Failed to create PDF for {}: {}", folder.display(), error));
    }

    fn on_file_deleted(&self, _path: &Path) {
        self.pending_deletions
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    fn on_deletion_failed(&self, path: &Path, error: &str) {
        self.emit(&format!("Error deleting image file {}: {}", path.display(), error));
    }

    fn on_conversion_complete(&self, pdf_count: usize) {
        self.flush_deletions();
        let plural = if pdf_count == 1 { "" } else { "s" };
        self.emit(&format!("Created {pdf_count} PDF file{plural}"));
    }
}
