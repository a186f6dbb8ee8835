//! Colmix Common Utilities
//!
//! Shared infrastructure for all Colmix crates:
//! - Error types and result aliases
//! - Frame pacing for producer loops
//! - Stoppable worker threads with liveness tracking
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod worker;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use worker::*;
