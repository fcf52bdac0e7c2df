//! Directory file sets fed to session initiation.

use crate::error::JpcomError;
use std::fs;
use std::path::{Path, PathBuf};

/// Regular files in `dir` whose extension matches `extension`
/// (case-insensitive, leading dot optional), sorted by file name.
///
/// An empty result is not an error; an unreadable directory is.
pub fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, JpcomError> {
    let wanted = extension.trim_start_matches('.');
    let read_error = |source| JpcomError::DirectoryRead {
        path: dir.display().to_string(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
        if matches {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}
