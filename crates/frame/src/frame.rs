//! Owned pixel buffers.

use std::fmt;

use colmix_common::error::{ColmixError, ColmixResult};
use serde::{Deserialize, Serialize};

/// Bytes per pixel. Every frame in the pipeline is 3-channel.
pub const CHANNELS: usize = 3;

/// Channel order of a 3-channel pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    /// Blue, green, red. Used by decoders and the compositor internally.
    #[default]
    Bgr,
    /// Red, green, blue. Used for display output.
    Rgb,
}

/// One decoded image from a single source.
///
/// Immutable once built: there is no mutable access to the pixel data.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a tightly packed pixel buffer.
    ///
    /// Fails if either dimension is zero or `data` is not exactly
    /// `width * height * CHANNELS` bytes.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> ColmixResult<Self> {
        if width == 0 || height == 0 {
            return Err(ColmixError::frame(format!(
                "Invalid frame dimensions {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(ColmixError::frame(format!(
                "Frame buffer for {width}x{height} must be {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// A frame where every pixel is `pixel`.
    pub fn filled(
        width: u32,
        height: u32,
        layout: PixelLayout,
        pixel: [u8; CHANNELS],
    ) -> ColmixResult<Self> {
        let count = width as usize * height as usize;
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(count * CHANNELS)
            .collect();
        Self::new(width, height, layout, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at column `x`, row `y`, in this frame's layout.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; CHANNELS]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * CHANNELS;
        let px = &self.data[offset..offset + CHANNELS];
        Some([px[0], px[1], px[2]])
    }

    /// Return this frame in `layout`, reversing channel order if needed.
    /// Values are never altered, only reordered.
    pub fn into_layout(self, layout: PixelLayout) -> Self {
        if self.layout == layout {
            return self;
        }
        let mut data = self.data;
        for px in data.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
        Self {
            width: self.width,
            height: self.height,
            layout,
            data,
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .field("bytes", &self.data.len())
            .finish()
    }
}
