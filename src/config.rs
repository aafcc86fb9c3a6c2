//! Configuration types for folder-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. There is deliberately no config file:
//! the handful of knobs are set by the caller (the CLI maps flags and
//! environment variables onto the builder).

use crate::error::Folder2PdfError;
use crate::pipeline::normalize::{self, HeicDecoder};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for a folder-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use folder2pdf::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .preserve_originals(false)
///     .page_size(PageSize::A4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Keep source images after their folder's PDF is written. Default: true.
    ///
    /// When `false`, every supported image directly in a folder is deleted
    /// once that folder's PDF has been saved, together with any PNG bridge
    /// files created for HEIC sources. When `true`, nothing is deleted and
    /// bridge PNGs remain next to their HEIC originals.
    pub preserve_originals: bool,

    /// Page size of every generated PDF. Default: US Letter (612 × 792 pt).
    pub page_size: PageSize,

    /// Whether HEIC sources can be decoded. Default: whether the crate was
    /// built with the `heic` feature.
    ///
    /// Resolved once and handed to the format normaliser. Setting it to
    /// `false` on a HEIC-capable build makes HEIC files be skipped.
    pub heic_supported: bool,

    /// HEIC decoder to use instead of the built-in one. Ignored while
    /// `heic_supported` is `false`.
    pub heic_decoder: Option<HeicDecoder>,

    /// Optional per-folder progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            preserve_originals: true,
            page_size: PageSize::default(),
            heic_supported: normalize::heic_available(),
            heic_decoder: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("preserve_originals", &self.preserve_originals)
            .field("page_size", &self.page_size)
            .field("heic_supported", &self.heic_supported)
            .field("heic_decoder", &self.heic_decoder.map(|_| "<fn>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check constraints the builder enforces. Called again by
    /// [`crate::convert`] since the fields are public.
    pub fn validate(&self) -> Result<(), Folder2PdfError> {
        let (w, h) = self.page_size.dimensions();
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(Folder2PdfError::InvalidConfig(format!(
                "Page size must be positive, got {w}×{h} pt"
            )));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn preserve_originals(mut self, v: bool) -> Self {
        self.config.preserve_originals = v;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn heic_supported(mut self, v: bool) -> Self {
        self.config.heic_supported = v;
        self
    }

    /// Decode HEIC with `decoder`; also turns HEIC support on.
    pub fn heic_decoder(mut self, decoder: HeicDecoder) -> Self {
        self.config.heic_decoder = Some(decoder);
        self.config.heic_supported = true;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Folder2PdfError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Fixed page size for every page of a generated PDF, in PDF points
/// (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 8.5 × 11 in, 612 × 792 pt. (default)
    #[default]
    Letter,
    /// 210 × 297 mm, 595.28 × 841.89 pt.
    A4,
    /// 8.5 × 14 in, 612 × 1008 pt.
    Legal,
    /// Any other size, in points.
    Custom { width: f32, height: f32 },
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match *self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}
