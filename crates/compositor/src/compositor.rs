//! The compositing worker.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use colmix_common::config::{MixerDefaults, ResizeFilter};
use colmix_common::error::ColmixResult;
use colmix_common::worker::{LivenessTracker, Worker, WorkerState};
use colmix_frame::{FrameChannel, TakeOutcome};
use serde::Serialize;

use crate::merge::compose;
use crate::sink::FrameSink;

/// Compositor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Longest wait on each channel before the cycle is abandoned.
    pub take_timeout: Duration,
    /// Resampling for resolution reconciliation.
    pub resize_filter: ResizeFilter,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::from(&MixerDefaults::default())
    }
}

impl From<&MixerDefaults> for CompositorConfig {
    fn from(defaults: &MixerDefaults) -> Self {
        Self {
            take_timeout: defaults.take_timeout(),
            resize_filter: defaults.resize_filter,
        }
    }
}

/// Compositor counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompositorStats {
    /// Cycles that delivered a frame to the sink.
    pub cycles_composited: u64,
    /// Cycles abandoned because a channel timed out or the merge failed.
    pub cycles_skipped: u64,
}

#[derive(Debug, Default)]
struct CompositorCounters {
    composited: AtomicU64,
    skipped: AtomicU64,
}

impl CompositorCounters {
    fn snapshot(&self) -> CompositorStats {
        CompositorStats {
            cycles_composited: self.composited.load(Ordering::Relaxed),
            cycles_skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Takes the newest frame from each channel, merges them, and renders the
/// result. Runs until stopped or until either channel is closed.
pub struct Compositor {
    first: Arc<FrameChannel>,
    second: Arc<FrameChannel>,
    sink: Arc<dyn FrameSink>,
    config: CompositorConfig,
    worker: Worker,
    counters: Arc<CompositorCounters>,
}

impl Compositor {
    pub fn new(
        first: Arc<FrameChannel>,
        second: Arc<FrameChannel>,
        sink: Arc<dyn FrameSink>,
        config: CompositorConfig,
        liveness: LivenessTracker,
    ) -> Self {
        Self {
            first,
            second,
            sink,
            config,
            worker: Worker::new("compositor", liveness),
            counters: Arc::new(CompositorCounters::default()),
        }
    }

    pub fn start(&mut self) -> ColmixResult<()> {
        let cycle = CompositeLoop {
            first: self.first.clone(),
            second: self.second.clone(),
            sink: self.sink.clone(),
            config: self.config,
            counters: self.counters.clone(),
        };
        tracing::info!(
            take_timeout_ms = self.config.take_timeout.as_millis() as u64,
            filter = ?self.config.resize_filter,
            "Starting compositor"
        );
        self.worker.start(move |stop| cycle.run(&stop))
    }

    /// Stop and join. If the channels are still open this waits out at most
    /// one take timeout per channel; close them first for a prompt exit.
    pub fn stop(&mut self) {
        self.worker.stop();
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn stats(&self) -> CompositorStats {
        self.counters.snapshot()
    }
}

struct CompositeLoop {
    first: Arc<FrameChannel>,
    second: Arc<FrameChannel>,
    sink: Arc<dyn FrameSink>,
    config: CompositorConfig,
    counters: Arc<CompositorCounters>,
}

impl CompositeLoop {
    fn run(self, stop: &AtomicBool) {
        let mut sequence = 0u64;
        while !stop.load(Ordering::Relaxed) {
            let first = match self.first.take(self.config.take_timeout) {
                TakeOutcome::Frame(frame) => frame,
                TakeOutcome::TimedOut => {
                    self.skip(self.first.name());
                    continue;
                }
                TakeOutcome::Closed => break,
            };
            let second = match self.second.take(self.config.take_timeout) {
                TakeOutcome::Frame(frame) => frame,
                TakeOutcome::TimedOut => {
                    self.skip(self.second.name());
                    continue;
                }
                TakeOutcome::Closed => break,
            };

            match compose(&first, &second, self.config.resize_filter, sequence) {
                Ok(mixed) => {
                    self.sink.render(mixed);
                    self.counters.composited.fetch_add(1, Ordering::Relaxed);
                    sequence += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Compositing cycle failed");
                    self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let stats = self.counters.snapshot();
        tracing::info!(
            composited = stats.cycles_composited,
            skipped = stats.cycles_skipped,
            "Compositor stopped"
        );
    }

    fn skip(&self, channel: &str) {
        self.counters.skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(channel, "No frame within timeout; cycle abandoned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LatestFrameSink;
    use colmix_frame::{Frame, PixelLayout};

    fn fast_config() -> CompositorConfig {
        CompositorConfig {
            take_timeout: Duration::from_millis(50),
            resize_filter: ResizeFilter::Bilinear,
        }
    }

    fn rig() -> (Arc<FrameChannel>, Arc<FrameChannel>, Arc<LatestFrameSink>, Compositor) {
        let first = Arc::new(FrameChannel::new("channel1"));
        let second = Arc::new(FrameChannel::new("channel2"));
        let sink = Arc::new(LatestFrameSink::new());
        let compositor = Compositor::new(
            first.clone(),
            second.clone(),
            sink.clone(),
            fast_config(),
            LivenessTracker::new(),
        );
        (first, second, sink, compositor)
    }

    #[test]
    fn test_one_frame_per_channel_renders_one_cycle() {
        let (first, second, sink, mut compositor) = rig();
        compositor.start().unwrap();

        first.publish(Frame::filled(8, 6, PixelLayout::Bgr, [1, 2, 3]).unwrap());
        second.publish(Frame::filled(4, 4, PixelLayout::Bgr, [4, 5, 6]).unwrap());
        let mixed = sink.wait_for_next(Duration::from_secs(2)).unwrap();

        first.close();
        second.close();
        compositor.stop();

        assert_eq!(mixed.sequence, 0);
        assert_eq!(mixed.frame.dimensions(), (8, 6));
        assert_eq!(mixed.metadata.overlay_text(), "1: 8x6 | 2: 4x4");
        assert_eq!(mixed.frame.pixel(0, 0), Some([6, 5, 4]));
        assert_eq!(mixed.frame.pixel(1, 0), Some([3, 2, 1]));
        assert_eq!(compositor.stats().cycles_composited, 1);
    }

    #[test]
    fn test_silent_second_channel_renders_nothing() {
        let (first, _second, sink, mut compositor) = rig();
        compositor.start().unwrap();
        first.publish(Frame::filled(2, 2, PixelLayout::Bgr, [0; 3]).unwrap());
        std::thread::sleep(Duration::from_millis(250));
        compositor.stop();

        assert_eq!(sink.frames_rendered(), 0);
        let stats = compositor.stats();
        assert_eq!(stats.cycles_composited, 0);
        assert!(stats.cycles_skipped >= 1);
    }

    #[test]
    fn test_closing_a_channel_ends_the_loop_promptly() {
        let (first, _second, _sink, mut compositor) = rig();
        compositor.config.take_timeout = Duration::from_secs(30);
        compositor.start().unwrap();

        std::thread::sleep(Duration::from_millis(20));
        let started = std::time::Instant::now();
        first.close();
        compositor.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(compositor.state(), WorkerState::Joined);
    }

    #[test]
    fn test_config_follows_mixer_defaults() {
        let defaults = MixerDefaults {
            take_timeout_ms: 250,
            resize_filter: ResizeFilter::Nearest,
            ..MixerDefaults::default()
        };
        let config = CompositorConfig::from(&defaults);
        assert_eq!(config.take_timeout, Duration::from_millis(250));
        assert_eq!(config.resize_filter, ResizeFilter::Nearest);
    }
}
