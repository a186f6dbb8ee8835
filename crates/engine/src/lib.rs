//! Colmix Engine
//!
//! Owns the lifetime of a mixing session. A session is two frame sources,
//! two latest-wins channels, and one compositor:
//!
//! ```text
//! ┌─────────────┐   ┌───────────┐
//! │ source1     │──▶│ channel1  │──┐
//! │ (video|img) │   └───────────┘  │   ┌────────────┐   ┌───────────┐
//! └─────────────┘                  ├──▶│ compositor │──▶│ FrameSink │
//! ┌─────────────┐   ┌───────────┐  │   └────────────┘   └───────────┘
//! │ source2     │──▶│ channel2  │──┘
//! │ (video|img) │   └───────────┘
//! └─────────────┘
//! ```
//!
//! The [`PipelineController`] guarantees at most one session at a time: a
//! restart joins every thread of the old session before building the new one.

pub mod control;
pub mod controller;
pub mod session;
pub mod stats;

pub use control::MixerControl;
pub use controller::PipelineController;
pub use session::PipelineSession;
pub use stats::{SessionStats, SourceReport};
