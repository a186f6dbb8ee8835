//! Display sinks: where composited frames go.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use colmix_frame::MixedFrame;

/// Receives one [`MixedFrame`] per successful compositing cycle.
///
/// Called from the compositor thread. Implementations that hand frames to a
/// UI must do their own thread marshalling and must not block for long.
pub trait FrameSink: Send + Sync {
    fn render(&self, mixed: MixedFrame);
}

impl<F> FrameSink for F
where
    F: Fn(MixedFrame) + Send + Sync,
{
    fn render(&self, mixed: MixedFrame) {
        self(mixed)
    }
}

/// Sink that keeps the most recent frame and its metadata for redraws.
///
/// Frame and metadata are stored as one value, so a reader never sees the
/// pixels of one cycle with the metadata of another.
#[derive(Debug, Default)]
pub struct LatestFrameSink {
    state: Mutex<LatestState>,
    rendered: Condvar,
}

#[derive(Debug, Default)]
struct LatestState {
    latest: Option<MixedFrame>,
    frames_rendered: u64,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last rendered frame, if any.
    pub fn latest(&self) -> Option<MixedFrame> {
        self.lock().latest.clone()
    }

    /// Total frames rendered since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.lock().frames_rendered
    }

    /// Block until a frame newer than the current one is rendered, or until
    /// `timeout` elapses.
    pub fn wait_for_next(&self, timeout: Duration) -> Option<MixedFrame> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        let seen = state.frames_rendered;
        while state.frames_rendered == seen {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .rendered
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        state.latest.clone()
    }

    /// Forget the retained frame.
    pub fn clear(&self) {
        self.lock().latest = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LatestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameSink for LatestFrameSink {
    fn render(&self, mixed: MixedFrame) {
        let mut state = self.lock();
        state.latest = Some(mixed);
        state.frames_rendered += 1;
        self.rendered.notify_all();
    }
}
