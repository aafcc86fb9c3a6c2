//! Image classification by file-name suffix.
//!
//! Membership is decided by extension alone, case-insensitively, so it is
//! cheap enough to run on every directory entry. `.pdf` is not in the set,
//! which is what makes "delete every image in the folder" safe to run right
//! after the folder's own PDF has been written.

use std::path::Path;

/// Suffixes recognised as images, lower-case, in the order they are
/// documented.
pub const SUPPORTED_EXTENSIONS: [&str; 7] =
    [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".heic"];

/// Suffix of sources that need a PNG bridge before they can be embedded.
pub const HEIC_EXTENSION: &str = ".heic";

/// `true` when `file_name` ends with one of [`SUPPORTED_EXTENSIONS`],
/// ignoring ASCII case.
pub fn is_supported_image(file_name: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| ends_with_ignore_case(file_name, ext))
}

/// Path flavour of [`is_supported_image`]; looks at the final component only.
///
/// Names that are not valid UTF-8 are matched on their lossy form, so only
/// the suffix has to be readable.
pub fn is_supported_image_path(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| is_supported_image(&n.to_string_lossy()))
}

/// `true` for `.heic` files, ignoring ASCII case.
pub fn is_heic(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| ends_with_ignore_case(&n.to_string_lossy(), HEIC_EXTENSION))
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    let (n, s) = (name.as_bytes(), suffix.as_bytes());
    n.len() >= s.len() && n[n.len() - s.len()..].eq_ignore_ascii_case(s)
}
