//! Clock and pacing utilities for frame producers.
//!
//! Every producer loop emits a frame and then sleeps for one frame interval.
//! This module provides:
//! - A session clock anchored at pipeline start
//! - Frame-rate resolution with a fallback for unreported rates
//! - A pacer whose sleep can be cut short by a stop request

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Rates at or below this are treated as "not reported".
pub const MIN_REPORTED_FPS: f64 = 0.01;

/// Longest single sleep slice while pacing; bounds stop latency.
const PACE_SLICE: Duration = Duration::from_millis(10);

/// A session clock that provides elapsed time relative to a fixed epoch
/// (the moment the session started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,
    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since the session started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// Pick the pacing rate for a stream, falling back when the reported rate is
/// missing, non-finite, or not above [`MIN_REPORTED_FPS`].
pub fn effective_fps(reported: Option<f64>, fallback: f64) -> f64 {
    match reported {
        Some(fps) if fps.is_finite() && fps > MIN_REPORTED_FPS => fps,
        _ => fallback.max(MIN_REPORTED_FPS),
    }
}

/// Sleeps one frame interval between emissions.
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    interval: Duration,
}

impl FramePacer {
    /// Create a pacer targeting `fps` frames per second.
    pub fn from_fps(fps: f64) -> Self {
        let fps = fps.max(MIN_REPORTED_FPS);
        Self {
            interval: Duration::from_secs_f64(1.0 / fps),
        }
    }

    /// Target interval between frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep for one interval, waking early if `stop` becomes set.
    /// Returns `false` if the wait was cut short by a stop request.
    pub fn wait(&self, stop: &AtomicBool) -> bool {
        let deadline = Instant::now() + self.interval;
        loop {
            if stop.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(PACE_SLICE));
        }
    }
}
