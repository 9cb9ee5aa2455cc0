//! Naming conventions shared by the image and video pipelines.

use std::path::Path;

const RESULT_SUFFIX: &str = "_result";
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// Derive the result artifact name for an input path.
///
/// The output is `{stem}_result.{ext}` where `stem` is the file name
/// without directory and extension. A `.` that only appears inside a
/// directory segment is not an extension marker, so `a.b/c` yields
/// `c_result.`. Without any separator the input splits on its last `.`,
/// even a leading one (`.hidden` yields `_result.hidden`). An input without
/// extension keeps the trailing dot.
pub fn derive_result_path(path: &str) -> String {
    let dot = path.rfind('.');
    let separator = path.rfind(std::path::is_separator);

    let (stem, extension) = match (dot, separator) {
        (Some(i), Some(j)) if i > j => (&path[j + 1..i], &path[i + 1..]),
        // no directory part: split on the last dot alone
        (Some(i), None) => (&path[..i], &path[i + 1..]),
        (_, Some(j)) => (&path[j + 1..], ""),
        (_, None) => (path, ""),
    };

    format!("{stem}{RESULT_SUFFIX}.{extension}")
}

/// Zero-padded snapshot file name for the n-th frame that had a hit
pub fn snapshot_file_name(index: usize) -> String {
    format!("frame_{index:03}.png")
}

/// Rough processing-time hint derived from where the video lives
pub fn estimate_label(path: &str) -> &'static str {
    if path.contains("/phone") {
        "Estimated time: ~2-3 minutes"
    } else if path.contains("/videos") {
        "Estimated time: ~1 minute"
    } else {
        "Estimated time: unknown"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by extension; anything that is not a known still format is video
    pub fn from_path(path: &Path) -> Self {
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false);

        if is_image {
            MediaKind::Image
        } else {
            MediaKind::Video
        }
    }
}
