//! Report file discovery.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Extension of report documents.
pub const REPORT_EXTENSION: &str = "html";

/// Find all `.html` files directly inside `dir` (not recursive), sorted by path.
///
/// Entries that cannot be inspected, such as dangling symlinks, are logged.
/// Those named `*.html` are still returned so that reading them fails later
/// as a document fault instead of the report silently vanishing.
pub fn find_report_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Report directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_report_extension(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf);
                match path {
                    Some(path) if has_report_extension(&path) => {
                        warn!("Cannot inspect report {}: {}", path.display(), e);
                        files.push(path);
                    }
                    Some(path) => warn!("Skipping unreadable entry {}: {}", path.display(), e),
                    None => warn!("Skipping unreadable entry in {}: {}", dir.display(), e),
                }
            }
        }
    }

    files.sort();
    files
}

fn has_report_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == REPORT_EXTENSION)
        .unwrap_or(false)
}
