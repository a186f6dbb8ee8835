//! Composited output and the source dimensions that produced it.

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Original dimensions of the two inputs of one compositing cycle.
///
/// The right-hand values are the second source's dimensions *before* it was
/// resized to match the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SourceMetadata {
    pub left_width: u32,
    pub left_height: u32,
    pub right_width: u32,
    pub right_height: u32,
}

impl SourceMetadata {
    /// Describe the two frames as taken from their channels.
    pub fn from_frames(left: &Frame, right: &Frame) -> Self {
        Self {
            left_width: left.width(),
            left_height: left.height(),
            right_width: right.width(),
            right_height: right.height(),
        }
    }

    /// Whether the second source needed resampling.
    pub fn needs_resize(&self) -> bool {
        self.left_width != self.right_width || self.left_height != self.right_height
    }

    /// Text a display sink draws when its metadata overlay is enabled.
    pub fn overlay_text(&self) -> String {
        format!(
            "1: {}x{} | 2: {}x{}",
            self.left_width, self.left_height, self.right_width, self.right_height
        )
    }
}

/// One compositing cycle's output: the display-ready frame and its metadata,
/// always delivered together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedFrame {
    /// Interleaved pixels in display layout.
    pub frame: Frame,
    /// Dimensions of the inputs that produced `frame`.
    pub metadata: SourceMetadata,
    /// Per-session cycle counter, starting at 0.
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelLayout;

    #[test]
    fn test_metadata_from_frames() {
        let left = Frame::filled(8, 6, PixelLayout::Bgr, [0, 0, 0]).unwrap();
        let right = Frame::filled(4, 2, PixelLayout::Bgr, [0, 0, 0]).unwrap();
        let meta = SourceMetadata::from_frames(&left, &right);
        assert_eq!(
            meta,
            SourceMetadata {
                left_width: 8,
                left_height: 6,
                right_width: 4,
                right_height: 2,
            }
        );
        assert!(meta.needs_resize());
    }

    #[test]
    fn test_overlay_text() {
        let meta = SourceMetadata {
            left_width: 1920,
            left_height: 1080,
            right_width: 1280,
            right_height: 720,
        };
        assert_eq!(meta.overlay_text(), "1: 1920x1080 | 2: 1280x720");
    }

    #[test]
    fn test_metadata_serializes_field_names() {
        let json = serde_json::to_string(&SourceMetadata::default()).unwrap();
        assert!(json.contains("\"right_height\":0"));
    }
}
