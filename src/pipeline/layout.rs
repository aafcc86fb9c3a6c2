//! Page fitting: scale an image onto a fixed page, keep its aspect ratio,
//! centre it.
//!
//! Pure arithmetic, kept apart from [`super::compose`] so the invariants
//! (aspect ratio preserved, never exceeds the page, equal margins) can be
//! tested without building a PDF.

/// Where and how large an image is drawn on a page, in PDF points with the
/// origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    /// `min(page_width / img_width, page_height / img_height)`.
    pub scale: f32,
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

impl PageGeometry {
    /// Fit an `img_width × img_height` pixel image onto the page.
    ///
    /// Images smaller than the page are scaled up and larger ones scaled
    /// down, so that exactly one dimension touches the page edges.
    /// Returns `None` for a zero-sized image.
    pub fn fit(img_width: u32, img_height: u32, page_width: f32, page_height: f32) -> Option<Self> {
        if img_width == 0 || img_height == 0 {
            return None;
        }
        let (iw, ih) = (img_width as f32, img_height as f32);

        let scale = (page_width / iw).min(page_height / ih);
        let width = iw * scale;
        let height = ih * scale;

        Some(Self {
            page_width,
            page_height,
            scale,
            width,
            height,
            x: (page_width - width) / 2.0,
            y: (page_height - height) / 2.0,
        })
    }
}
