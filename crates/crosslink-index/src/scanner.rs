//! File discovery by filesystem walking.
//!
//! The scanner only collects relative paths of regular files. Turning those
//! paths into lookup keys is handled by [`PathIndex`](crate::PathIndex).

use std::fs;
use std::path::Path;

use crate::IndexError;

/// Walk `root` recursively and return the forward-slash relative path of every
/// regular file below it.
///
/// Entries of each directory are visited in file name order, so the returned
/// list is stable across runs. Symbolic links are neither followed nor indexed.
pub(crate) fn scan_files(root: &Path) -> Result<Vec<String>, IndexError> {
    let mut files = Vec::new();
    scan_directory(root, "", &mut files)?;
    Ok(files)
}

fn scan_directory(dir: &Path, prefix: &str, files: &mut Vec<String>) -> Result<(), IndexError> {
    let entries = fs::read_dir(dir).map_err(|e| IndexError::io(dir, e))?;

    // Cache file_type to avoid repeated stat calls
    let mut entries: Vec<_> = entries
        .filter_map(Result::ok)
        .filter_map(|e| {
            let file_type = e.file_type().ok()?;
            let name = e.file_name().to_string_lossy().into_owned();
            Some((e, file_type, name))
        })
        .collect();
    entries.sort_by(|a, b| a.2.cmp(&b.2));

    for (entry, file_type, name) in entries {
        let rel_path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        if file_type.is_dir() {
            scan_directory(&entry.path(), &rel_path, files)?;
        } else if file_type.is_file() {
            files.push(rel_path);
        }
    }

    Ok(())
}
