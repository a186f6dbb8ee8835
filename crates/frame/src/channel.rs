//! Single-slot, newest-wins frame hand-off.
//!
//! Each channel has exactly one producer and one consumer. `publish` never
//! blocks: a frame that has not been taken yet is overwritten, so the
//! consumer always sees the freshest data and never a backlog.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::frame::Frame;

/// Result of waiting on a channel.
#[derive(Debug)]
pub enum TakeOutcome {
    /// The newest published frame; the slot is now empty.
    Frame(Frame),
    /// Nothing was published within the timeout. Not an error.
    TimedOut,
    /// The channel was closed; no more frames will arrive.
    Closed,
}

impl TakeOutcome {
    /// The frame, if one was received.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            Self::TimedOut | Self::Closed => None,
        }
    }
}

/// Counters for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Frames accepted by `publish`.
    pub published: u64,
    /// Frames replaced before the consumer took them.
    pub overwritten: u64,
    /// Frames handed to the consumer.
    pub taken: u64,
}

impl ChannelStats {
    /// Share of published frames that were overwritten, as a percentage.
    pub fn drop_rate(&self) -> f64 {
        if self.published == 0 {
            return 0.0;
        }
        self.overwritten as f64 / self.published as f64 * 100.0
    }
}

#[derive(Debug, Default)]
struct Slot {
    frame: Option<Frame>,
    closed: bool,
    stats: ChannelStats,
}

/// Capacity-1 hand-off between a frame source and the compositor.
#[derive(Debug)]
pub struct FrameChannel {
    name: String,
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl FrameChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: Mutex::new(Slot::default()),
            ready: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `frame`, replacing any frame not yet taken. Never blocks.
    /// Frames published after `close` are discarded.
    pub fn publish(&self, frame: Frame) {
        let mut slot = self.lock();
        if slot.closed {
            return;
        }
        if slot.frame.replace(frame).is_some() {
            slot.stats.overwritten += 1;
        }
        slot.stats.published += 1;
        drop(slot);
        self.ready.notify_one();
    }

    /// Wait up to `timeout` for a frame.
    pub fn take(&self, timeout: Duration) -> TakeOutcome {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        loop {
            if slot.closed {
                return TakeOutcome::Closed;
            }
            if let Some(frame) = slot.frame.take() {
                slot.stats.taken += 1;
                return TakeOutcome::Frame(frame);
            }
            let now = Instant::now();
            if now >= deadline {
                return TakeOutcome::TimedOut;
            }
            slot = self
                .ready
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Take the pending frame without waiting.
    pub fn try_take(&self) -> Option<Frame> {
        let mut slot = self.lock();
        if slot.closed {
            return None;
        }
        let frame = slot.frame.take();
        if frame.is_some() {
            slot.stats.taken += 1;
        }
        frame
    }

    /// Drop any residual frame.
    pub fn clear(&self) {
        if self.lock().frame.take().is_some() {
            tracing::trace!(channel = %self.name, "Cleared residual frame");
        }
    }

    /// Close the channel: drop any residual frame, wake a blocked `take`, and
    /// make every later `take` return [`TakeOutcome::Closed`] immediately.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.frame = None;
        drop(slot);
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Whether a frame is waiting to be taken.
    pub fn has_pending(&self) -> bool {
        self.lock().frame.is_some()
    }

    pub fn stats(&self) -> ChannelStats {
        self.lock().stats
    }

    // The slot holds no invariant a panicking holder could break, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelLayout;
    use std::sync::Arc;

    fn frame_with(value: u8) -> Frame {
        Frame::filled(2, 2, PixelLayout::Bgr, [value; 3]).unwrap()
    }

    #[test]
    fn test_newest_frame_wins() {
        let channel = FrameChannel::new("test");
        channel.publish(frame_with(1));
        channel.publish(frame_with(2));

        let frame = channel.take(Duration::from_millis(10)).into_frame().unwrap();
        assert_eq!(frame.pixel(0, 0), Some([2, 2, 2]));
        assert!(matches!(
            channel.take(Duration::from_millis(10)),
            TakeOutcome::TimedOut
        ));

        let stats = channel.stats();
        assert_eq!(stats.published, 2);
        assert_eq!(stats.overwritten, 1);
        assert_eq!(stats.taken, 1);
        assert!((stats.drop_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_take_on_empty_times_out_within_bound() {
        let channel = FrameChannel::new("empty");
        let started = Instant::now();
        let outcome = channel.take(Duration::from_millis(100));
        let elapsed = started.elapsed();
        assert!(matches!(outcome, TakeOutcome::TimedOut));
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(600));
    }

    #[test]
    fn test_take_wakes_on_publish() {
        let channel = Arc::new(FrameChannel::new("wake"));
        let producer = {
            let channel = channel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                channel.publish(frame_with(9));
            })
        };
        let started = Instant::now();
        let frame = channel.take(Duration::from_secs(5)).into_frame();
        assert!(frame.is_some());
        assert!(started.elapsed() < Duration::from_secs(2));
        producer.join().unwrap();
    }

    #[test]
    fn test_close_wakes_blocked_take() {
        let channel = Arc::new(FrameChannel::new("close"));
        let closer = {
            let channel = channel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                channel.close();
            })
        };
        let started = Instant::now();
        assert!(matches!(
            channel.take(Duration::from_secs(5)),
            TakeOutcome::Closed
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
        closer.join().unwrap();
        assert!(channel.is_closed());

        channel.publish(frame_with(1));
        assert!(!channel.has_pending());
        assert!(channel.try_take().is_none());
    }

    #[test]
    fn test_clear_drops_residual_frame() {
        let channel = FrameChannel::new("clear");
        channel.publish(frame_with(3));
        assert!(channel.has_pending());
        channel.clear();
        assert!(!channel.has_pending());
        assert!(channel.try_take().is_none());
    }
}
