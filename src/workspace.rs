use std::path::Path;

use tracing::{debug, warn};

/// Delete every regular file directly inside `folder`.
///
/// Subdirectories are left alone. A missing path or a path that is not a
/// directory counts as an already clear workspace. Individual delete
/// failures are logged and the remaining files are still processed.
/// Returns the number of files removed.
pub fn clear_folder(folder: &Path) -> usize {
    if !folder.is_dir() {
        warn!(path = %folder.display(), "The specified path is not a valid directory.");
        return 0;
    }

    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %folder.display(), error = %e, "Failed to list directory");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete file"),
        }
    }

    debug!(path = %folder.display(), removed, "Cleared workspace");
    removed
}
