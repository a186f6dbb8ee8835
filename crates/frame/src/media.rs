//! Input classification by file name.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions decoded as video when no configuration overrides them.
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

/// How an input path is turned into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Decoded sequentially and looped.
    Video,
    /// Decoded once and repeated.
    Image,
}

impl MediaKind {
    /// Classify against [`DEFAULT_VIDEO_EXTENSIONS`].
    pub fn classify(path: &Path) -> Self {
        Self::classify_with(path, &DEFAULT_VIDEO_EXTENSIONS)
    }

    /// Classify by a case-insensitive suffix match of `.<ext>` on the whole
    /// path string. Anything that is not a listed video extension is an image.
    pub fn classify_with<S: AsRef<str>>(path: &Path, video_extensions: &[S]) -> Self {
        let name = path.to_string_lossy().to_lowercase();
        let is_video = video_extensions.iter().any(|ext| {
            let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
            !ext.is_empty() && name.ends_with(&format!(".{ext}"))
        });
        if is_video {
            Self::Video
        } else {
            Self::Image
        }
    }
}
