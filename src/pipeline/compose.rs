//! PDF composition: one image per fixed-size page.
//!
//! Pages are built by hand with lopdf: each image becomes an image XObject
//! and a four-operator content stream places it using [`PageGeometry`].
//! JPEG files keep their original bytes behind a `DCTDecode` filter. Other
//! formats are decoded and Flate-compressed, with a soft mask when they
//! carry real transparency.
//!
//! The document is only written when [`PdfComposer::save`] succeeds, and it
//! is written to a temporary file in the target directory first, then
//! renamed over `<dirName>.pdf`. A failed build leaves any previous PDF
//! untouched and never leaves a truncated one behind.

use super::layout::PageGeometry;
use crate::config::PageSize;
use crate::error::FolderError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Draw buffer for the page currently being assembled.
#[derive(Default)]
struct PendingPage {
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

/// Assembles a PDF whose pages all share one fixed size.
pub struct PdfComposer {
    pdf_path: PathBuf,
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    page_width: f32,
    page_height: f32,
    pending: Option<PendingPage>,
    next_image: usize,
}

impl PdfComposer {
    /// Start an empty document that will be saved to `pdf_path`.
    pub fn new(pdf_path: impl Into<PathBuf>, page_size: PageSize) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let (page_width, page_height) = page_size.dimensions();
        Self {
            pdf_path: pdf_path.into(),
            doc,
            pages_id,
            kids: Vec::new(),
            page_width,
            page_height,
            pending: None,
            next_image: 0,
        }
    }

    pub fn pdf_path(&self) -> &Path {
        &self.pdf_path
    }

    /// Pages finished so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Draw `image_path` scaled-to-fit and centred on the current page.
    ///
    /// Does not finish the page; call [`show_page`](Self::show_page) to
    /// move on. Baseline and progressive 8-bit JPEGs are embedded as-is
    /// (`DCTDecode`); everything else is decoded and re-compressed with
    /// Flate. An image that cannot be read here fails the whole PDF with
    /// [`FolderError::ImageLoadFailed`].
    pub fn place_on_page(&mut self, image_path: &Path) -> Result<PageGeometry, FolderError> {
        let load_err = |detail: String| FolderError::ImageLoadFailed {
            path: image_path.to_path_buf(),
            detail,
        };

        let bytes = std::fs::read(image_path).map_err(|e| load_err(e.to_string()))?;
        let (mut stream, smask, (width, height)) = match jpeg_info(&bytes) {
            Some(info) => (dct_image_stream(info, bytes), None, (info.width, info.height)),
            None => {
                let img = image::load_from_memory(&bytes).map_err(|e| load_err(e.to_string()))?;
                let (stream, smask) = image_xobject(&img).map_err(|e| self.build_err(e))?;
                (stream, smask, (img.width(), img.height()))
            }
        };
        let geometry = PageGeometry::fit(width, height, self.page_width, self.page_height)
            .ok_or_else(|| load_err("image has zero width or height".to_string()))?;

        if let Some(mask) = smask {
            let mask_id = self.doc.add_object(mask);
            stream.dict.set("SMask", mask_id);
        }
        let image_id = self.doc.add_object(stream);

        self.next_image += 1;
        let name = format!("Im{}", self.next_image);

        let page = self.pending.get_or_insert_with(PendingPage::default);
        page.xobjects.set(name.as_bytes().to_vec(), image_id);
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(geometry.width),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(geometry.height),
                    Object::Real(geometry.x),
                    Object::Real(geometry.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);

        debug!(
            "Placed {} ({}x{} px) at ({:.1}, {:.1}) size {:.1}x{:.1} pt",
            image_path.display(),
            width,
            height,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height
        );
        Ok(geometry)
    }

    /// Finish the current page and start a fresh one.
    ///
    /// A page with nothing drawn on it is still emitted, as a blank page.
    pub fn show_page(&mut self) -> Result<(), FolderError> {
        let page = self.pending.take().unwrap_or_default();

        let content = Content {
            operations: page.operations,
        };
        let encoded = content.encode().map_err(|e| self.build_err(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

        let media_box = self.media_box();
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => page.xobjects,
            },
        });
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    /// Write the document to its PDF path, replacing any existing file.
    ///
    /// A page still being drawn is finished first.
    pub fn save(mut self) -> Result<PathBuf, FolderError> {
        if self.pending.is_some() {
            self.show_page()?;
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids.clone(),
            "Count" => self.kids.len() as i64,
            "MediaBox" => self.media_box(),
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let title = self
            .pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal(concat!("folder2pdf ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Info", info_id);

        let write_err = |path: &Path, detail: String| FolderError::PdfWriteFailed {
            path: path.to_path_buf(),
            detail,
        };

        let dir = match self.pdf_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".folder2pdf-")
            .suffix(".part")
            .tempfile_in(&dir)
            .map_err(|e| write_err(&self.pdf_path, e.to_string()))?;

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.doc
                .save_to(&mut writer)
                .map_err(|e| write_err(&self.pdf_path, e.to_string()))?;
            writer
                .flush()
                .map_err(|e| write_err(&self.pdf_path, e.to_string()))?;
        }

        // Temp files are created 0600; finished PDFs get 0644.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o644);
            if let Err(e) = tmp.as_file().set_permissions(perms) {
                debug!("Could not set permissions on {}: {}", tmp.path().display(), e);
            }
        }

        tmp.persist(&self.pdf_path)
            .map_err(|e| write_err(&self.pdf_path, e.error.to_string()))?;

        debug!("Saved {} ({} pages)", self.pdf_path.display(), self.kids.len());
        Ok(self.pdf_path)
    }

    fn media_box(&self) -> Vec<Object> {
        vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.page_width),
            Object::Real(self.page_height),
        ]
    }

    fn build_err(&self, detail: String) -> FolderError {
        FolderError::PdfBuildFailed {
            path: self.pdf_path.clone(),
            detail,
        }
    }
}

/// Frame parameters of a JPEG that a PDF reader can decode directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegInfo {
    width: u32,
    height: u32,
    components: u8,
    /// An Adobe APP14 segment was seen; its CMYK data is stored inverted.
    adobe: bool,
}

/// Walk the JPEG marker segments up to the frame header.
///
/// Returns `None` for anything that is not an 8-bit baseline, extended or
/// progressive Huffman JPEG with 1, 3 or 4 components. Those go through the
/// decode path instead.
fn jpeg_info(data: &[u8]) -> Option<JpegInfo> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut adobe = false;
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes and markers without a length field.
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if matches!(marker, 0x01 | 0xD0..=0xD7) {
            pos += 2;
            continue;
        }

        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 {
            return None;
        }
        let end = pos + 2 + len;
        let body = data.get(pos + 4..end)?;

        match marker {
            0xEE if body.starts_with(b"Adobe") => adobe = true,
            0xC0..=0xC2 => {
                // precision, height, width, component count
                if body.len() < 6 || body[0] != 8 {
                    return None;
                }
                let height = u16::from_be_bytes([body[1], body[2]]) as u32;
                let width = u16::from_be_bytes([body[3], body[4]]) as u32;
                let components = body[5];
                if width == 0 || height == 0 || !matches!(components, 1 | 3 | 4) {
                    return None;
                }
                return Some(JpegInfo {
                    width,
                    height,
                    components,
                    adobe,
                });
            }
            // Lossless, hierarchical and arithmetic-coded frames.
            0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => return None,
            // Scan data before any frame header.
            0xDA => return None,
            _ => {}
        }
        pos = end;
    }
    None
}

/// Image XObject carrying the JPEG file bytes unchanged.
fn dct_image_stream(info: JpegInfo, jpeg: Vec<u8>) -> Stream {
    let color_space = match info.components {
        1 => "DeviceGray",
        4 => "DeviceCMYK",
        _ => "DeviceRGB",
    };
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => info.width as i64,
        "Height" => info.height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8_i64,
        "Filter" => "DCTDecode",
    };
    if info.components == 4 && info.adobe {
        let decode: Vec<Object> = (0..4)
            .flat_map(|_| [Object::Integer(1), Object::Integer(0)])
            .collect();
        dict.set("Decode", decode);
    }
    Stream::new(dict, jpeg)
}

/// Build the image XObject for `img`, plus a soft-mask XObject when the
/// image has any pixel that is not fully opaque.
fn image_xobject(img: &DynamicImage) -> Result<(Stream, Option<Stream>), String> {
    let (width, height) = (img.width(), img.height());
    let color = img.color();

    let (color_space, pixels) = if color.has_color() {
        ("DeviceRGB", img.to_rgb8().into_raw())
    } else {
        ("DeviceGray", img.to_luma8().into_raw())
    };

    let smask = if color.has_alpha() {
        let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p.0[3]).collect();
        if alpha.iter().any(|&a| a != u8::MAX) {
            Some(flate_image_stream(width, height, "DeviceGray", &alpha)?)
        } else {
            None
        }
    } else {
        None
    };

    Ok((flate_image_stream(width, height, color_space, &pixels)?, smask))
}

fn flate_image_stream(width: u32, height: u32, color_space: &str, raw: &[u8]) -> Result<Stream, String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .map_err(|e| format!("Failed to compress image data: {e}"))?;
    let compressed = encoder
        .finish()
        .map_err(|e| format!("Failed to finish compression: {e}"))?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8_i64,
        "Filter" => "FlateDecode",
    };
    Ok(Stream::new(dict, compressed))
}
