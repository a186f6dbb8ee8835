//! Colmix Compositor
//!
//! Merges the newest frame from each of two channels into one display-ready
//! frame by interleaving pixel columns.
//!
//! # Compositing Cycle
//!
//! ```text
//! channel 1 ── take(timeout) ──┐
//!                              ├── resize 2 to 1's size (if needed)
//! channel 2 ── take(timeout) ──┘         │
//!                                        ├── even columns from 2, odd from 1
//!                                        │
//!                                        ├── BGR → RGB
//!                                        ▼
//!                           sink.render(MixedFrame + SourceMetadata)
//! ```
//!
//! A timeout on either channel abandons the cycle; nothing partial is ever
//! rendered.

pub mod compositor;
pub mod merge;
pub mod sink;

pub use compositor::*;
pub use merge::*;
pub use sink::*;
