//! Input directory enumeration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Collect candidate files under `dir`, sorted by path.
///
/// Subdirectories are descended into when `recursive` is set, following
/// symlinks but visiting each real directory once. With an `extension`,
/// only files with that extension (case-insensitive) are kept.
pub fn collect_files(
    dir: &Path,
    recursive: bool,
    extension: Option<&str>,
) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    walk(dir, recursive, extension, &mut visited, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(
    dir: &Path,
    recursive: bool,
    extension: Option<&str>,
    visited: &mut HashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    if !visited.insert(std::fs::canonicalize(dir)?) {
        log::debug!("Skipping {}: directory already visited", dir.display());
        return Ok(());
    }

    let mut entries: Vec<std::fs::DirEntry> = std::fs::read_dir(dir)?.flatten().collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_file() {
            if extension.is_none_or(|ext| has_extension(&path, ext)) {
                files.push(path);
            }
        } else if recursive && path.is_dir() {
            if let Err(e) = walk(&path, recursive, extension, visited, files) {
                log::warn!("Skipping unreadable directory {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}

/// Check if a path has the given extension (case-insensitive).
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}
