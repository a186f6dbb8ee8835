//! Sequential frame reading for video sources.

use colmix_common::error::ColmixResult;
use colmix_frame::Frame;

/// Trait for a seekable, sequential video decoder.
///
/// Implementations wrap a native decoding backend. A `DecodingSource` drives
/// one reader from its worker thread and drops it when the thread exits, so
/// dropping a reader must release every native resource it holds.
pub trait FrameReader: Send {
    /// Native frame rate, if the stream reports one.
    fn fps(&self) -> Option<f64>;

    /// Frame dimensions, if known before the first read.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Read the next frame in BGR layout.
    ///
    /// Returns `None` at end of stream and on any read failure; callers treat
    /// both the same way.
    fn read_frame(&mut self) -> Option<Frame>;

    /// Seek back to the first frame.
    fn rewind(&mut self) -> ColmixResult<()>;
}

/// Deferred reader construction, run on the source's worker thread.
pub type ReaderOpener = Box<dyn FnOnce() -> ColmixResult<Box<dyn FrameReader>> + Send>;
