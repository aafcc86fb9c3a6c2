//! Post-PDF cleanup: purge bridge files, then delete original images.
//!
//! Only ever runs for a folder whose PDF was written. Failures are per
//! file: they are collected and reported, and never stop the sweep.

use super::classify;
use crate::output::DeletionFailure;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files removed and files that resisted removal.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanupReport {
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<DeletionFailure>,
}

impl CleanupReport {
    fn remove(&mut self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                self.deleted.push(path.to_path_buf());
            }
            // Already gone; nothing to report.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Error deleting image file {}: {}", path.display(), e);
                self.failures.push(DeletionFailure {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                });
            }
        }
    }

    fn merge(&mut self, other: CleanupReport) {
        self.deleted.extend(other.deleted);
        self.failures.extend(other.failures);
    }
}

/// Remove the PNG bridge files synthesised for this folder.
pub fn remove_bridge_files(files: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for file in files {
        report.remove(file);
    }
    report
}

/// Delete every regular file directly in `folder` whose name matches the
/// image classifier. Subdirectories and non-image files (the PDF itself
/// included) are left alone.
pub fn delete_original_images(folder: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();

    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {} for cleanup: {}", folder.display(), e);
            report.failures.push(DeletionFailure {
                path: folder.to_path_buf(),
                detail: e.to_string(),
            });
            return report;
        }
    };

    let mut targets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && classify::is_supported_image_path(path))
        .collect();
    targets.sort();

    for path in &targets {
        report.remove(path);
    }
    report
}

/// Bridge purge followed by original deletion, as one report.
pub fn purge_folder(folder: &Path, bridge_files: &[PathBuf]) -> CleanupReport {
    let mut report = remove_bridge_files(bridge_files);
    report.merge(delete_original_images(folder));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn deletes_only_images() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["a.jpg", "B.PNG", "c.heic", "notes.txt", "root.pdf"] {
            fs::write(root.join(name), b"x").unwrap();
        }
        fs::create_dir(root.join("sub.jpg")).unwrap();

        let report = delete_original_images(root);

        assert_eq!(report.deleted.len(), 3);
        assert!(report.failures.is_empty());
        assert!(root.join("notes.txt").exists());
        assert!(root.join("root.pdf").exists());
        assert!(root.join("sub.jpg").is_dir(), "directories are never deleted");
        assert!(!root.join("a.jpg").exists());
    }

    #[test]
    fn missing_bridge_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("x.png");
        fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("gone.png");

        let report = remove_bridge_files(&[present.clone(), missing]);
        assert_eq!(report.deleted, vec![present]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn unlistable_folder_is_a_failure_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let report = delete_original_images(&dir.path().join("nope"));
        assert!(report.deleted.is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn purge_removes_bridge_before_originals() {
        let dir = tempfile::tempdir().unwrap();
        let heic = dir.path().join("IMG_1.heic");
        let png = dir.path().join("IMG_1.png");
        fs::write(&heic, b"h").unwrap();
        fs::write(&png, b"p").unwrap();

        let report = purge_folder(dir.path(), &[png.clone()]);
        assert_eq!(report.deleted.first(), Some(&png));
        assert_eq!(report.deleted.len(), 2);
        assert!(!heic.exists());
    }
}
