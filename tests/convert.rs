//! Integration tests for folder2pdf.
//!
//! Every test builds a throwaway directory tree under a `tempfile::TempDir`,
//! fills it with images generated by the `image` crate, runs the converter,
//! and reads the resulting PDFs back with `lopdf`.
//!
//! Run with:
//!   cargo test --test convert -- --nocapture
//!
//! Set `RUST_LOG=folder2pdf=debug` to see the library's tracing output.

use folder2pdf::{
    convert, convert_path, inspect, inspect_path, ConversionConfig, ConversionOutcome, ConversionProgressCallback,
    Folder2PdfError, FolderError, LineProgress, PageSize, SkipReason,
};
use image::{Rgb, RgbImage};
use lopdf::{Document, Stream};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A temp dir holding one folder named `name`, returned canonicalised so it
/// compares equal to the paths the converter reports.
fn tree(name: &str) -> (TempDir, PathBuf) {
    init_logging();
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join(name);
    fs::create_dir(&root).expect("mkdir");
    let root = root.canonicalize().expect("canonicalize");
    (tmp, root)
}

/// Write a solid-colour image; the format follows the extension.
fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir parent");
    }
    RgbImage::from_pixel(width, height, Rgb([90, 160, 220]))
        .save(path)
        .expect("write test image");
}

fn keep() -> ConversionConfig {
    ConversionConfig::builder()
        .preserve_originals(true)
        .heic_supported(false)
        .build()
        .expect("valid config")
}

fn delete() -> ConversionConfig {
    ConversionConfig::builder()
        .preserve_originals(false)
        .heic_supported(false)
        .build()
        .expect("valid config")
}

fn run(root: &Path, config: &ConversionConfig) -> folder2pdf::ConversionSummary {
    convert(root.to_string_lossy(), config).expect("conversion should succeed")
}

/// The image XObject on each page, in page order.
fn page_images(pdf: &Path) -> Vec<Stream> {
    let doc = Document::load(pdf).expect("readable PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).expect("page dict");
            let resources = page
                .get(b"Resources")
                .and_then(|o| o.as_dict())
                .expect("resources");
            let xobjects = resources
                .get(b"XObject")
                .and_then(|o| o.as_dict())
                .expect("xobjects");
            let (_, image_ref) = xobjects.iter().next().expect("one image per page");
            doc.get_object(image_ref.as_reference().expect("reference"))
                .and_then(|o| o.as_stream())
                .expect("image stream")
                .clone()
        })
        .collect()
}

/// Pixel width of the image on each page, in page order.
fn page_image_widths(pdf: &Path) -> Vec<i64> {
    page_images(pdf)
        .iter()
        .map(|image| image.dict.get(b"Width").and_then(|w| w.as_i64()).expect("width"))
        .collect()
}

fn page_count(pdf: &Path) -> usize {
    Document::load(pdf).expect("readable PDF").get_pages().len()
}

fn collect_lines() -> (Arc<Mutex<Vec<String>>>, Arc<dyn ConversionProgressCallback>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let progress = LineProgress::new(move |line: &str| {
        sink.lock().unwrap().push(line.to_string());
    });
    (lines, Arc::new(progress))
}

// ── Page order ───────────────────────────────────────────────────────────────

#[test]
fn pages_follow_sorted_file_names() {
    let (_tmp, root) = tree("album");
    // Widths identify the pages: b.jpg is 30 px wide, a.png 10 px, c.gif 20 px.
    write_image(&root.join("b.jpg"), 30, 10);
    write_image(&root.join("a.png"), 10, 10);
    write_image(&root.join("c.gif"), 20, 10);

    let summary = run(&root, &keep());

    let pdf = root.join("album.pdf");
    assert_eq!(summary.pdfs(), vec![&pdf]);
    assert_eq!(page_image_widths(&pdf), vec![10, 30, 20]);

    let report = summary.folder(&root).expect("root report");
    match &report.outcome {
        ConversionOutcome::Written { pages, .. } => assert_eq!(
            pages,
            &vec![root.join("a.png"), root.join("b.jpg"), root.join("c.gif")]
        ),
        other => panic!("expected Written, got {other:?}"),
    }
}

#[test]
fn uppercase_extensions_are_included() {
    let (_tmp, root) = tree("caps");
    write_image(&root.join("IMG_1.JPG"), 12, 8);
    write_image(&root.join("IMG_2.Png"), 12, 8);

    run(&root, &keep());
    assert_eq!(page_count(&root.join("caps.pdf")), 2);
}

#[test]
fn jpeg_pages_keep_the_original_bytes() {
    let (_tmp, root) = tree("jpegs");
    write_image(&root.join("photo.jpg"), 64, 48);
    write_image(&root.join("scan.png"), 32, 32);

    run(&root, &keep());

    let images = page_images(&root.join("jpegs.pdf"));
    assert_eq!(images.len(), 2);

    let jpeg = &images[0];
    assert_eq!(
        jpeg.dict.get(b"Filter").and_then(|f| f.as_name()).expect("filter"),
        b"DCTDecode"
    );
    assert_eq!(jpeg.content, fs::read(root.join("photo.jpg")).unwrap());

    let png = &images[1];
    assert_eq!(
        png.dict.get(b"Filter").and_then(|f| f.as_name()).expect("filter"),
        b"FlateDecode"
    );
}

// ── Tree conversion and preservation ─────────────────────────────────────────

#[test]
fn preserving_keeps_originals_and_writes_one_pdf_per_folder() {
    let (_tmp, root) = tree("root");
    write_image(&root.join("x.jpg"), 40, 30);
    write_image(&root.join("sub").join("y.png"), 30, 40);

    let summary = run(&root, &keep());

    assert_eq!(summary.pdf_count(), 2);
    assert_eq!(page_count(&root.join("root.pdf")), 1);
    assert_eq!(page_count(&root.join("sub").join("sub.pdf")), 1);
    assert!(root.join("x.jpg").exists());
    assert!(root.join("sub").join("y.png").exists());
    assert_eq!(summary.deleted_count(), 0);
}

#[test]
fn deleting_removes_originals_but_keeps_pdfs() {
    let (_tmp, root) = tree("root");
    write_image(&root.join("x.jpg"), 40, 30);
    write_image(&root.join("sub").join("y.png"), 30, 40);
    fs::write(root.join("notes.txt"), "keep me").unwrap();

    let summary = run(&root, &delete());

    assert!(!root.join("x.jpg").exists());
    assert!(!root.join("sub").join("y.png").exists());
    assert!(root.join("root.pdf").exists());
    assert!(root.join("sub").join("sub.pdf").exists());
    assert!(root.join("notes.txt").exists(), "non-images are never deleted");
    assert_eq!(summary.deleted_count(), 2);
    assert_eq!(summary.deletion_failure_count(), 0);
}

#[test]
fn folder_without_direct_images_still_converts_its_children() {
    let (_tmp, root) = tree("outer");
    write_image(&root.join("inner").join("deeper").join("p.bmp"), 5, 5);

    let summary = run(&root, &keep());

    assert!(!root.join("outer.pdf").exists());
    assert!(!root.join("inner").join("inner.pdf").exists());
    assert!(root.join("inner").join("deeper").join("deeper.pdf").exists());
    assert_eq!(summary.pdf_count(), 1);
    assert_eq!(
        summary.folder(&root).map(|r| &r.outcome),
        Some(&ConversionOutcome::NoImages)
    );
}

#[test]
fn empty_folder_produces_nothing_and_no_error() {
    let (_tmp, root) = tree("empty");

    let summary = run(&root, &delete());

    assert_eq!(summary.pdf_count(), 0);
    assert_eq!(summary.failed_count(), 0);
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn rerun_overwrites_existing_pdf() {
    let (_tmp, root) = tree("again");
    write_image(&root.join("1.png"), 10, 10);
    run(&root, &keep());
    assert_eq!(page_count(&root.join("again.pdf")), 1);

    write_image(&root.join("2.png"), 10, 10);
    let summary = run(&root, &keep());

    assert_eq!(summary.failed_count(), 0);
    assert_eq!(page_count(&root.join("again.pdf")), 2);
}

#[test]
fn page_size_sets_media_box() {
    let (_tmp, root) = tree("a4");
    write_image(&root.join("p.png"), 10, 10);
    let config = ConversionConfig::builder()
        .page_size(PageSize::A4)
        .build()
        .unwrap();

    run(&root, &config);

    let doc = Document::load(root.join("a4.pdf")).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let media_box = doc
        .get_dictionary(page_id)
        .and_then(|d| d.get(b"MediaBox"))
        .and_then(|o| o.as_array())
        .unwrap();
    let width = media_box[2].as_float().unwrap();
    let height = media_box[3].as_float().unwrap();
    assert!((width - 595.28).abs() < 0.01, "width {width}");
    assert!((height - 841.89).abs() < 0.01, "height {height}");
}

// ── HEIC handling ────────────────────────────────────────────────────────────

#[test]
fn heic_without_support_is_left_out() {
    let (_tmp, root) = tree("phone");
    write_image(&root.join("a.jpg"), 16, 9);
    fs::write(root.join("IMG_0001.HEIC"), b"ftypheic-ish bytes").unwrap();

    let summary = run(&root, &keep());

    assert_eq!(page_count(&root.join("phone.pdf")), 1);
    assert!(!root.join("IMG_0001.png").exists(), "no bridge without a decoder");
    let report = summary.folder(&root).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::HeicUnsupported);
}

#[test]
fn heic_only_folder_without_support_gets_no_pdf() {
    let (_tmp, root) = tree("heics");
    fs::write(root.join("a.heic"), b"x").unwrap();

    let summary = run(&root, &delete());

    assert_eq!(summary.pdf_count(), 0);
    assert!(
        root.join("a.heic").exists(),
        "nothing is deleted when no PDF was written"
    );
}

#[cfg(feature = "heic")]
#[test]
fn undecodable_heic_with_decoder_is_skipped() {
    let (_tmp, root) = tree("broken");
    write_image(&root.join("ok.png"), 8, 8);
    fs::write(root.join("bad.heic"), b"not a heif container").unwrap();
    let config = ConversionConfig::builder().heic_supported(true).build().unwrap();

    let summary = run(&root, &config);

    assert_eq!(page_count(&root.join("broken.pdf")), 1);
    assert!(matches!(
        summary.folder(&root).unwrap().skipped[0].reason,
        SkipReason::DecodeFailed(_)
    ));
}

/// Stand-in HEIC decoder: accepts files starting with `FAKEHEIC` and
/// returns a 24×12 image.
fn fake_heic_decoder(path: &Path) -> Result<image::DynamicImage, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    if !bytes.starts_with(b"FAKEHEIC") {
        return Err("not a fake HEIC".to_string());
    }
    Ok(image::DynamicImage::ImageRgb8(RgbImage::from_pixel(
        24,
        12,
        Rgb([200, 100, 0]),
    )))
}

fn bridged(preserve_originals: bool) -> ConversionConfig {
    ConversionConfig::builder()
        .preserve_originals(preserve_originals)
        .heic_decoder(fake_heic_decoder)
        .build()
        .expect("valid config")
}

#[test]
fn decoded_heic_is_embedded_and_bridge_kept_when_preserving() {
    let (_tmp, root) = tree("phone");
    fs::write(root.join("IMG_1.heic"), b"FAKEHEIC payload").unwrap();
    write_image(&root.join("a.jpg"), 16, 9);

    let summary = run(&root, &bridged(true));

    let pdf = root.join("phone.pdf");
    // "IMG_1.png" sorts before "a.jpg".
    assert_eq!(page_image_widths(&pdf), vec![24, 16]);
    assert!(root.join("IMG_1.png").exists(), "bridge PNG stays");
    assert!(root.join("IMG_1.heic").exists());
    let report = summary.folder(&root).unwrap();
    assert!(report.skipped.is_empty());
    match &report.outcome {
        ConversionOutcome::Written { pages, .. } => {
            assert_eq!(pages, &vec![root.join("IMG_1.png"), root.join("a.jpg")])
        }
        other => panic!("expected Written, got {other:?}"),
    }
}

#[test]
fn decoded_heic_and_bridge_are_removed_when_deleting() {
    let (_tmp, root) = tree("phone");
    fs::write(root.join("IMG_1.heic"), b"FAKEHEIC payload").unwrap();
    write_image(&root.join("a.jpg"), 16, 9);

    let summary = run(&root, &bridged(false));

    let pdf = root.join("phone.pdf");
    assert_eq!(page_image_widths(&pdf), vec![24, 16]);
    assert!(!root.join("IMG_1.png").exists(), "bridge PNG purged");
    assert!(!root.join("IMG_1.heic").exists(), "HEIC original deleted");
    assert!(!root.join("a.jpg").exists());
    assert_eq!(summary.deletion_failure_count(), 0);
}

#[test]
fn bridge_overwrites_same_named_png_and_is_embedded_once() {
    let (_tmp, root) = tree("phone");
    write_image(&root.join("IMG_1.png"), 5, 5);
    fs::write(root.join("IMG_1.heic"), b"FAKEHEIC payload").unwrap();

    run(&root, &bridged(true));

    assert_eq!(page_image_widths(&root.join("phone.pdf")), vec![24]);
    let bridge = image::open(root.join("IMG_1.png")).expect("bridge decodes");
    assert_eq!((bridge.width(), bridge.height()), (24, 12));
}

#[test]
fn decoder_error_skips_only_that_file() {
    let (_tmp, root) = tree("phone");
    fs::write(root.join("IMG_1.heic"), b"something else").unwrap();
    write_image(&root.join("a.png"), 7, 7);

    let summary = run(&root, &bridged(false));

    assert_eq!(page_image_widths(&root.join("phone.pdf")), vec![7]);
    assert!(!root.join("IMG_1.png").exists());
    let report = summary.folder(&root).unwrap();
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::DecodeFailed("not a fake HEIC".to_string())
    );
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn missing_folder_is_fatal() {
    init_logging();
    let err = convert("/definitely/not/a/real/folder", &keep()).unwrap_err();
    assert!(matches!(err, Folder2PdfError::FolderNotFound { .. }), "{err:?}");
}

#[test]
fn file_instead_of_folder_is_fatal() {
    let (_tmp, root) = tree("f");
    let file = root.join("a.png");
    write_image(&file, 2, 2);

    let err = convert(file.to_string_lossy(), &keep()).unwrap_err();
    assert!(matches!(err, Folder2PdfError::NotADirectory { .. }), "{err:?}");
    assert!(inspect(file.to_string_lossy()).is_err());
}

#[test]
fn corrupt_image_fails_only_its_own_folder() {
    let (_tmp, root) = tree("mixed");
    write_image(&root.join("good").join("a.png"), 10, 10);
    fs::create_dir(root.join("bad")).unwrap();
    fs::write(root.join("bad").join("b.jpg"), b"not a jpeg").unwrap();
    write_image(&root.join("top.png"), 10, 10);

    let summary = run(&root, &delete());

    assert_eq!(summary.failed_count(), 1);
    assert!(root.join("good").join("good.pdf").exists());
    assert!(root.join("mixed.pdf").exists());
    assert!(!root.join("bad").join("bad.pdf").exists());
    assert!(
        root.join("bad").join("b.jpg").exists(),
        "a failed folder keeps its files"
    );

    let bad = summary.folder(root.join("bad")).unwrap();
    match &bad.outcome {
        ConversionOutcome::Failed {
            error: FolderError::ImageLoadFailed { path, .. },
        } => assert_eq!(path, &root.join("bad").join("b.jpg")),
        other => panic!("expected ImageLoadFailed, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    let (_tmp, root) = tree("links");
    write_image(&root.join("real").join("a.png"), 4, 4);
    std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

    let summary = run(&root, &keep());

    assert_eq!(summary.pdf_count(), 1);
    assert!(!root.join("alias").join("alias.pdf").exists());
}

// ── Caller-facing surface ────────────────────────────────────────────────────

#[test]
fn quoted_path_with_whitespace_is_accepted() {
    let (_tmp, root) = tree("quoted");
    write_image(&root.join("a.png"), 4, 4);

    let raw = format!("  \"{}\"  ", root.display());
    let summary = convert(raw, &keep()).expect("quoted path should resolve");
    assert_eq!(summary.root, root);
    assert_eq!(summary.pdf_count(), 1);
}

#[test]
fn line_progress_reports_each_folder() {
    let (_tmp, root) = tree("lines");
    write_image(&root.join("a.png"), 4, 4);
    fs::create_dir(root.join("nothing")).unwrap();
    let (lines, progress) = collect_lines();
    let config = ConversionConfig::builder()
        .preserve_originals(false)
        .heic_supported(false)
        .progress_callback(progress)
        .build()
        .unwrap();

    run(&root, &config);

    let lines = lines.lock().unwrap();
    assert!(lines
        .iter()
        .any(|l| l == &format!("Processing images in folder: {}", root.display())));
    assert!(lines.iter().any(|l| l.contains("No image files found in")));
    assert!(lines.iter().any(|l| l == "Finished creating: lines.pdf"));
    assert!(lines.iter().any(|l| l == "Image files deleted."));
    assert_eq!(lines.last().map(String::as_str), Some("Created 1 PDF file"));
}

#[test]
fn callback_sees_every_page() {
    struct Pages(AtomicUsize);
    impl ConversionProgressCallback for Pages {
        fn on_page_added(&self, _pdf: &Path, page_num: usize, total: usize, _image: &Path) {
            assert!(page_num >= 1 && page_num <= total);
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let (_tmp, root) = tree("count");
    for i in 0..4 {
        write_image(&root.join(format!("{i}.png")), 3, 3);
    }
    let pages = Arc::new(Pages(AtomicUsize::new(0)));
    let config = ConversionConfig::builder()
        .progress_callback(pages.clone())
        .build()
        .unwrap();

    run(&root, &config);
    assert_eq!(pages.0.load(Ordering::SeqCst), 4);
}

#[test]
fn inspect_matches_what_convert_does() {
    let (_tmp, root) = tree("plan");
    write_image(&root.join("a.png"), 4, 4);
    write_image(&root.join("s").join("b.png"), 4, 4);
    fs::create_dir(root.join("empty")).unwrap();

    let inventory = inspect(root.to_string_lossy()).unwrap();
    assert_eq!(inventory.image_count, 2);
    assert_eq!(inventory.folder_count, 3);
    assert!(!root.join("plan.pdf").exists(), "inspect writes nothing");

    let summary = run(&root, &keep());
    let mut produced: Vec<PathBuf> = summary
        .folders
        .iter()
        .filter(|r| r.pdf_path().is_some())
        .map(|r| r.folder.clone())
        .collect();
    produced.sort();
    assert_eq!(produced, inventory.folders_with_images);
}

#[test]
fn path_entry_points_skip_string_normalisation() {
    let (_tmp, root) = tree("plain");
    write_image(&root.join("a.png"), 4, 4);

    let summary = convert_path(&root, &keep()).expect("conversion should succeed");
    assert_eq!(summary.pdfs(), vec![&root.join("plain.pdf")]);
    assert_eq!(inspect_path(&root).unwrap().image_count, 1);

    // Quotes are part of the name here, not stripped.
    let quoted = PathBuf::from(format!("'{}'", root.display()));
    assert!(matches!(
        convert_path(&quoted, &keep()),
        Err(Folder2PdfError::FolderNotFound { .. })
    ));
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_folder_names_convert() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (_tmp, root) = tree("parent");
    let album = root.join(OsStr::from_bytes(b"alb\xFFum"));
    write_image(&album.join(OsStr::from_bytes(b"caf\xE9.jpg")), 6, 6);

    let summary = convert_path(&root, &keep()).expect("conversion should succeed");

    let pdf = album.join(OsStr::from_bytes(b"alb\xFFum.pdf"));
    assert_eq!(summary.pdfs(), vec![&pdf]);
    assert_eq!(page_count(&pdf), 1);
    assert_eq!(inspect_path(&root).unwrap().image_count, 1);
}

#[test]
fn summary_serialises_to_json() {
    let (_tmp, root) = tree("json");
    write_image(&root.join("a.png"), 4, 4);

    let summary = run(&root, &keep());
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["preserve_originals"], true);
    assert_eq!(json["folders"][0]["outcome"]["status"], "written");
}
