//! Colmix Media Sources
//!
//! Frame producers that feed a [`FrameChannel`](colmix_frame::FrameChannel).
//! Each source owns one worker thread and paces its own output.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  open_source                 │
//! │        (classify path by file extension)     │
//! │          │                        │          │
//! │          ▼                        ▼          │
//! │  ┌────────────────┐     ┌──────────────────┐ │
//! │  │ DecodingSource │     │ RepeatingImage-  │ │
//! │  │  FrameReader   │     │ Source           │ │
//! │  │  (GStreamer)   │     │ (decode once)    │ │
//! │  └───────┬────────┘     └────────┬─────────┘ │
//! │          │ publish at 1/fps      │ publish   │
//! │          ▼                       ▼ at 1/fps  │
//! │   ┌─────────────────────────────────────┐    │
//! │   │    FrameChannel (latest wins)       │    │
//! │   └─────────────────────────────────────┘    │
//! └──────────────────────────────────────────────┘
//! ```

pub mod decoding;
pub mod gst_reader;
pub mod image_source;
pub mod reader;
pub mod source;

pub use decoding::DecodingSource;
pub use gst_reader::GstFrameReader;
pub use image_source::{load_image_frame, RepeatingImageSource};
pub use reader::{FrameReader, ReaderOpener};
pub use source::*;
