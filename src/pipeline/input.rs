//! Input resolution: normalise a user-supplied folder path and validate it.
//!
//! Paths arrive from text boxes, prompts and drag-and-drop, so they often
//! carry stray whitespace, surrounding quotes or a leading `~`. They are
//! cleaned up here once; everything downstream works on a canonical,
//! absolute directory path so that `<dirName>.pdf` is always derivable.

use crate::error::Folder2PdfError;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Clean up a caller-supplied path string.
///
/// * trims surrounding whitespace
/// * strips matching or stray leading/trailing `'` and `"` (copy/paste
///   artefacts)
/// * expands a leading `~` to the current user's home directory
/// * drops `.` components and redundant separators
///
/// The result is not checked against the file system.
pub fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();

    let cleaned: PathBuf = expand_home(trimmed)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    // "." collapses to nothing once CurDir is dropped; keep it meaning "here".
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"))
    {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a caller-supplied folder string to a canonical directory path.
///
/// Returns [`Folder2PdfError::FolderNotFound`],
/// [`Folder2PdfError::NotADirectory`] or
/// [`Folder2PdfError::PermissionDenied`] before any processing happens.
pub fn resolve_folder(raw: &str) -> Result<PathBuf, Folder2PdfError> {
    let path = normalize_path(raw);
    validate_folder(&path)
}

/// Validate an already-normalised path and canonicalise it.
pub fn validate_folder(path: &Path) -> Result<PathBuf, Folder2PdfError> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Folder2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Folder2PdfError::FolderNotFound {
            path: path.to_path_buf(),
        },
    })?;

    if !metadata.is_dir() {
        return Err(Folder2PdfError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    let canonical = path
        .canonicalize()
        .map_err(|e| Folder2PdfError::ReadDirFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    // Listing up front turns an unreadable root into a fatal error instead
    // of a directory-local one.
    std::fs::read_dir(&canonical).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Folder2PdfError::PermissionDenied {
            path: canonical.clone(),
        },
        _ => Folder2PdfError::ReadDirFailed {
            path: canonical.clone(),
            source: e,
        },
    })?;

    debug!("Resolved folder: {}", canonical.display());
    Ok(canonical)
}
