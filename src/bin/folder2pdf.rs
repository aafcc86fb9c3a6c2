//! CLI binary for folder2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use folder2pdf::{
    convert, inspect, ConversionConfig, ConversionOutcome, ConversionProgressCallback,
    ConversionSummary, LineProgress, PageSize, ProgressCallback, SkipReason,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the folder and page being
/// worked on, with one log line per finished PDF above it.
struct CliProgressCallback {
    bar: ProgressBar,
    pages: AtomicUsize,
    deleted: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  {msg}  {pos:>4} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            pages: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_folder_start(&self, folder: &Path, candidates: usize) {
        self.bar.set_prefix("Converting");
        self.bar
            .set_message(format!("{} ({candidates} images)", file_name(folder)));
    }

    fn on_heic_converted(&self, source: &Path, _png: &Path) {
        self.bar.set_message(format!("HEIC → PNG {}", file_name(source)));
    }

    fn on_file_skipped(&self, path: &Path, reason: &SkipReason) {
        self.bar.println(format!(
            "  {} {}  {}",
            cyan("⚠"),
            path.display(),
            dim(&reason.to_string())
        ));
    }

    fn on_page_added(&self, pdf: &Path, page_num: usize, total: usize, _image: &Path) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.bar.inc(1);
        self.bar
            .set_message(format!("{} page {page_num}/{total}", file_name(pdf)));
    }

    fn on_pdf_written(&self, pdf: &Path, pages: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            pdf.display(),
            dim(&format!("{pages} pages"))
        ));
    }

    fn on_folder_failed(&self, folder: &Path, error: &str) {
        self.bar
            .println(format!("  {} {}  {}", red("✗"), folder.display(), red(error)));
    }

    fn on_file_deleted(&self, _path: &Path) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    fn on_deletion_failed(&self, path: &Path, error: &str) {
        self.bar.println(format!(
            "  {} could not delete {}  {}",
            red("✗"),
            path.display(),
            dim(error)
        ));
    }

    fn on_conversion_complete(&self, pdf_count: usize) {
        self.bar.finish_and_clear();
        let pages = self.pages.load(Ordering::Relaxed);
        let deleted = self.deleted.load(Ordering::Relaxed);
        eprintln!(
            "{} {} PDFs written  {}",
            green("✔"),
            bold(&pdf_count.to_string()),
            dim(&format!("{pages} pages, {deleted} files deleted")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One PDF per folder, originals kept
  folder2pdf ~/Pictures/2024

  # Delete the images once each folder's PDF is written
  folder2pdf --delete-originals "~/Scans/receipts"

  # A4 pages
  folder2pdf --page-size a4 ./photos

  # See what would be converted, without writing anything
  folder2pdf --inspect-only ./photos

  # Machine-readable report
  folder2pdf --json ./photos > report.json

SUPPORTED IMAGES:
  .jpg .jpeg .png .gif .bmp .tiff .heic   (any letter case)

  HEIC needs a build with the `heic` feature (libheif). Without it, HEIC
  files are skipped and listed; the rest of the folder still converts.

OUTPUT:
  Every folder that directly contains images gets <folder name>.pdf inside
  it, one image per page in file-name order, scaled to fit and centred.
  Existing PDFs of that name are replaced.

ENVIRONMENT VARIABLES:
  FOLDER2PDF_DELETE_ORIGINALS   Same as --delete-originals
  FOLDER2PDF_PAGE_SIZE          letter, a4 or legal
  FOLDER2PDF_NO_HEIC            Same as --no-heic
  RUST_LOG                      Override log filtering (e.g. folder2pdf=debug)
"#;

/// Convert folders of images into one PDF per folder.
#[derive(Parser, Debug)]
#[command(
    name = "folder2pdf",
    version,
    about = "Convert folders of images into one PDF per folder",
    long_about = "Walk a directory tree and write <folder name>.pdf into every folder that \
directly contains images (JPEG, PNG, GIF, BMP, TIFF, HEIC). Subfolders get their own PDFs. \
Originals are kept unless --delete-originals is given.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder to convert. Quotes and a leading `~` are accepted.
    folder: String,

    /// Delete each folder's images (and PNG bridge files) after its PDF is written.
    #[arg(long, env = "FOLDER2PDF_DELETE_ORIGINALS")]
    delete_originals: bool,

    /// Page size of the generated PDFs.
    #[arg(long, env = "FOLDER2PDF_PAGE_SIZE", value_enum, default_value = "letter")]
    page_size: PageSizeArg,

    /// Skip HEIC files even if this build can decode them.
    #[arg(long, env = "FOLDER2PDF_NO_HEIC")]
    no_heic: bool,

    /// Count images and target folders only; write nothing.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON report on stdout.
    #[arg(long, env = "FOLDER2PDF_JSON")]
    json: bool,

    /// Disable the progress spinner and print plain status lines instead.
    #[arg(long, env = "FOLDER2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FOLDER2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FOLDER2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    Letter,
    A4,
    Legal,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Legal => PageSize::Legal,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports everything at INFO level, so library
    // logs are limited to errors while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let inventory = inspect(&cli.folder).context("Failed to inspect folder")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&inventory).context("Failed to serialise inventory")?
            );
        } else {
            let heic = !cli.no_heic && folder2pdf::pipeline::normalize::heic_available();
            println!("Folder:          {}", inventory.root.display());
            println!("Folders:         {}", inventory.folder_count);
            println!("Images:          {}", inventory.image_count);
            println!(
                "HEIC images:     {}{}",
                inventory.heic_count,
                if heic || inventory.heic_count == 0 {
                    ""
                } else {
                    " (will be skipped: no HEIC support)"
                }
            );
            println!("PDFs to write:   {}", inventory.folders_with_images.len());
            for folder in &inventory.folders_with_images {
                println!("  {}", folder2pdf::pdf_path_for(folder).display());
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else if !cli.quiet && !cli.json {
        let lines = LineProgress::new(|line: &str| eprintln!("{line}"));
        Some(Arc::new(lines) as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let summary = convert(&cli.folder, &config).context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary);
    }

    let failed = summary.failed_count();
    if failed > 0 {
        anyhow::bail!(
            "{failed} folder{} could not be converted",
            if failed == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .preserve_originals(!cli.delete_originals)
        .page_size(cli.page_size.into());

    if cli.no_heic {
        builder = builder.heic_supported(false);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Closing lines after the callback's own output.
fn print_summary(summary: &ConversionSummary) {
    for report in summary.failed() {
        if let ConversionOutcome::Failed { error } = &report.outcome {
            eprintln!("{} {}", red("✘"), error);
        }
    }

    let skipped = summary.skipped_count();
    if skipped > 0 {
        eprintln!(
            "{} {} images left out of their PDFs",
            cyan("⚠"),
            bold(&skipped.to_string())
        );
    }
    let undeleted = summary.deletion_failure_count();
    if undeleted > 0 {
        eprintln!(
            "{} {} files could not be deleted",
            cyan("⚠"),
            bold(&undeleted.to_string())
        );
    }

    if summary.pdf_count() == 0 && summary.failed_count() == 0 {
        eprintln!("{}", dim("No image files found."));
    }
    eprintln!(
        "{}",
        dim(&format!(
            "{} pages in {} PDFs, {}ms",
            summary.page_count(),
            summary.pdf_count(),
            summary.duration_ms
        ))
    );
}
