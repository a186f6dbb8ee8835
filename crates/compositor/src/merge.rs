//! Pure frame merging: resolution matching, column interleave, and the
//! display color conversion.
//!
//! No threads, no channels. All inputs are frames; all outputs are frames.

use colmix_common::config::ResizeFilter;
use colmix_common::error::{ColmixError, ColmixResult};
use colmix_frame::{Frame, MixedFrame, PixelLayout, SourceMetadata, CHANNELS};
use image::imageops::FilterType;
use image::{ImageBuffer, Rgb};

/// Channel order of the emitted `MixedFrame`.
pub const DISPLAY_LAYOUT: PixelLayout = PixelLayout::Rgb;

/// Resample `frame` to exactly `width` x `height`.
pub fn resize_frame(
    frame: &Frame,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> ColmixResult<Frame> {
    if frame.dimensions() == (width, height) {
        return Ok(frame.clone());
    }
    // Resampling treats channels independently, so the `Rgb` pixel type is
    // only a container here and BGR data comes out as BGR.
    let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(|| ColmixError::frame("Frame buffer does not match its dimensions"))?;
    let resized = image::imageops::resize(&buffer, width, height, filter_type(filter));
    Frame::new(width, height, frame.layout(), resized.into_raw())
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Bilinear => FilterType::Triangle,
    }
}

/// Copy `left`, then overwrite every even column (0, 2, 4, ...) with the
/// same column of `right`. Both frames must share dimensions and layout.
pub fn interleave_columns(left: &Frame, right: &Frame) -> ColmixResult<Frame> {
    if left.dimensions() != right.dimensions() {
        return Err(ColmixError::frame(format!(
            "Cannot interleave {}x{} with {}x{}",
            left.width(),
            left.height(),
            right.width(),
            right.height()
        )));
    }
    if left.layout() != right.layout() {
        return Err(ColmixError::frame("Cannot interleave frames of different layouts"));
    }

    let stride = left.stride();
    let width = left.width() as usize;
    let src = right.data();
    let mut out = left.data().to_vec();
    for row in out.chunks_exact_mut(stride).zip(src.chunks_exact(stride)) {
        let (dst_row, src_row) = row;
        for x in (0..width).step_by(2) {
            let o = x * CHANNELS;
            dst_row[o..o + CHANNELS].copy_from_slice(&src_row[o..o + CHANNELS]);
        }
    }
    Frame::new(left.width(), left.height(), left.layout(), out)
}

/// Merge two source frames at the first frame's resolution.
///
/// The returned metadata describes both frames as received, so the right
/// dimensions are those from before any resize.
pub fn merge(
    left: &Frame,
    right: &Frame,
    filter: ResizeFilter,
) -> ColmixResult<(Frame, SourceMetadata)> {
    let metadata = SourceMetadata::from_frames(left, right);

    let matched = if metadata.needs_resize() {
        resize_frame(right, left.width(), left.height(), filter)?
    } else {
        right.clone()
    };
    let matched = matched.into_layout(left.layout());

    Ok((interleave_columns(left, &matched)?, metadata))
}

/// One full compositing step: merge, then convert to [`DISPLAY_LAYOUT`].
pub fn compose(
    left: &Frame,
    right: &Frame,
    filter: ResizeFilter,
    sequence: u64,
) -> ColmixResult<MixedFrame> {
    let (merged, metadata) = merge(left, right, filter)?;
    Ok(MixedFrame {
        frame: merged.into_layout(DISPLAY_LAYOUT),
        metadata,
        sequence,
    })
}
