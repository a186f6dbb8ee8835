//! Colmix Frame Model
//!
//! Defines the data that flows through a mixing pipeline:
//! - **Frame:** an owned 3-channel pixel buffer tagged with its channel order
//! - **MixedFrame:** a composited frame plus the source dimensions behind it
//! - **MediaKind:** extension-based classification of input paths
//! - **FrameChannel:** the single-slot, newest-wins hand-off between a
//!   producer thread and the compositor
//!
//! Frames are tightly packed: `stride == width * CHANNELS`.

pub mod channel;
pub mod frame;
pub mod media;
pub mod metadata;

pub use channel::*;
pub use frame::*;
pub use media::*;
pub use metadata::*;
