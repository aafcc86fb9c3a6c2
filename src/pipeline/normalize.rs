//! Format normalisation: make every candidate embeddable.
//!
//! JPEG, PNG, GIF, BMP and TIFF are decoded directly when their page is
//! drawn, so they pass through untouched. HEIC is not, so each HEIC source
//! is decoded here and written out as a PNG *bridge file* next to it
//! (`IMG_0001.heic` → `IMG_0001.png`). Bridge files are reported separately
//! so the caller can purge them after the PDF is written.
//!
//! An existing file at the bridge path is overwritten. That keeps reruns
//! idempotent: the second run regenerates the same PNG.
//!
//! HEIC decoding comes from libheif and is only compiled in with the `heic`
//! feature. Whether it is available is resolved once ([`heic_available`])
//! and carried by [`FormatNormalizer`]; a normaliser without it skips HEIC
//! files with [`SkipReason::HeicUnsupported`] instead of failing the run.
//! A different decoder can be plugged in with
//! [`FormatNormalizer::with_decoder`].

use super::classify;
use crate::output::SkipReason;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whether this build can decode HEIC.
pub fn heic_available() -> bool {
    cfg!(feature = "heic")
}

/// What normalisation made of one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Directly embeddable; use the original path.
    Ready(PathBuf),
    /// A PNG bridge was synthesised for `source`.
    Bridged { source: PathBuf, png: PathBuf },
    /// Left out of the PDF.
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Decodes one HEIC file into pixels; the error is a human-readable detail.
pub type HeicDecoder = fn(&Path) -> Result<DynamicImage, String>;

/// Turns candidate images into embeddable ones.
#[derive(Clone, Copy)]
pub struct FormatNormalizer {
    heic_supported: bool,
    decoder: HeicDecoder,
}

impl FormatNormalizer {
    /// Uses the built-in decoder when `heic_supported` is set.
    pub fn new(heic_supported: bool) -> Self {
        Self {
            heic_supported,
            decoder: decode_heic,
        }
    }

    /// HEIC enabled, decoded by `decoder` instead of libheif.
    pub fn with_decoder(decoder: HeicDecoder) -> Self {
        Self {
            heic_supported: true,
            decoder,
        }
    }

    /// A normaliser using whatever this build supports.
    pub fn detect() -> Self {
        Self::new(heic_available())
    }

    pub fn heic_supported(&self) -> bool {
        self.heic_supported
    }

    /// Normalise one candidate.
    ///
    /// Never fails: problems with a single file become
    /// [`Normalized::Skipped`] so the rest of the folder still converts.
    pub fn normalize(&self, path: &Path) -> Normalized {
        if !classify::is_heic(path) {
            return Normalized::Ready(path.to_path_buf());
        }

        if !self.heic_supported {
            warn!("Skipping HEIC file (no support): {}", path.display());
            return Normalized::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::HeicUnsupported,
            };
        }

        let image = match (self.decoder)(path) {
            Ok(img) => img,
            Err(detail) => {
                warn!("Error loading image {}: {}", path.display(), detail);
                return Normalized::Skipped {
                    path: path.to_path_buf(),
                    reason: SkipReason::DecodeFailed(detail),
                };
            }
        };

        let png = bridge_path(path);
        if let Err(e) = image.save_with_format(&png, ImageFormat::Png) {
            warn!("Failed to write PNG bridge {}: {}", png.display(), e);
            // A half-written bridge must not end up in the PDF or linger.
            let _ = std::fs::remove_file(&png);
            return Normalized::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::BridgeFailed(e.to_string()),
            };
        }

        debug!("Converting .heic {} to {}", path.display(), png.display());
        Normalized::Bridged {
            source: path.to_path_buf(),
            png,
        }
    }
}

impl fmt::Debug for FormatNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatNormalizer")
            .field("heic_supported", &self.heic_supported)
            .finish_non_exhaustive()
    }
}

impl Default for FormatNormalizer {
    fn default() -> Self {
        Self::detect()
    }
}

/// Sibling PNG path for a HEIC source: same directory, same stem.
pub fn bridge_path(source: &Path) -> PathBuf {
    source.with_extension("png")
}

#[cfg(feature = "heic")]
fn decode_heic(path: &Path) -> Result<DynamicImage, String> {
    use image::RgbImage;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let name = path
        .to_str()
        .ok_or_else(|| "path is not valid UTF-8".to_string())?;
    let lib = LibHeif::new();
    let ctx = HeifContext::read_from_file(name).map_err(|e| e.to_string())?;
    let handle = ctx.primary_image_handle().map_err(|e| e.to_string())?;
    let decoded = lib
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| e.to_string())?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| "decoder returned no interleaved RGB plane".to_string())?;

    let (width, height) = (plane.width, plane.height);
    let row_len = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    // Rows are padded to `stride` bytes.
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }

    RgbImage::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| format!("decoded buffer does not match {width}x{height}"))
}

#[cfg(not(feature = "heic"))]
fn decode_heic(_path: &Path) -> Result<DynamicImage, String> {
    Err("this build has no HEIC decoder (enable the `heic` feature)".to_string())
}
