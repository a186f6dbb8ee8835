//! Looping video producer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colmix_common::clock::{effective_fps, FramePacer};
use colmix_common::error::{ColmixError, ColmixResult};
use colmix_common::worker::{LivenessTracker, Worker, WorkerState};
use colmix_frame::FrameChannel;

use crate::gst_reader::GstFrameReader;
use crate::reader::{FrameReader, ReaderOpener};
use crate::source::{FrameSource, SourceCounters, SourceStats};

/// Reads a video sequentially, publishing one frame per source frame
/// interval, and rewinds to the first frame whenever a read fails.
///
/// The stream is opened on the worker thread. If it cannot be opened the
/// thread logs a warning and exits without publishing anything; `start`
/// itself still succeeds.
pub struct DecodingSource {
    name: String,
    path: PathBuf,
    channel: Arc<FrameChannel>,
    fallback_fps: f64,
    opener: Option<ReaderOpener>,
    worker: Worker,
    counters: Arc<SourceCounters>,
}

impl DecodingSource {
    /// A source decoding `path` with GStreamer.
    pub fn new(
        name: &str,
        path: &Path,
        channel: Arc<FrameChannel>,
        fallback_fps: f64,
        liveness: LivenessTracker,
    ) -> Self {
        let owned = path.to_path_buf();
        let opener: ReaderOpener = Box::new(move || {
            GstFrameReader::open(&owned).map(|reader| Box::new(reader) as Box<dyn FrameReader>)
        });
        Self::with_opener(name, path, channel, fallback_fps, liveness, opener)
    }

    /// A source reading through a caller-supplied decoder.
    pub fn with_opener(
        name: &str,
        path: &Path,
        channel: Arc<FrameChannel>,
        fallback_fps: f64,
        liveness: LivenessTracker,
        opener: ReaderOpener,
    ) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            channel,
            fallback_fps,
            opener: Some(opener),
            worker: Worker::new(name, liveness),
            counters: Arc::new(SourceCounters::default()),
        }
    }
}

impl FrameSource for DecodingSource {
    fn start(&mut self) -> ColmixResult<()> {
        let opener = self.opener.take().ok_or_else(|| {
            ColmixError::pipeline(format!("{} has already been started", self.name))
        })?;
        let ctx = DecodeLoop {
            name: self.name.clone(),
            path: self.path.clone(),
            channel: self.channel.clone(),
            fallback_fps: self.fallback_fps,
            counters: self.counters.clone(),
        };
        tracing::info!(source = %self.name, path = %self.path.display(), "Starting video source");
        self.worker.start(move |stop| ctx.run(opener, &stop))
    }

    fn stop(&mut self) {
        self.worker.stop();
    }

    fn state(&self) -> WorkerState {
        self.worker.state()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn stats(&self) -> SourceStats {
        self.counters.snapshot()
    }
}

/// Everything the worker thread needs, moved onto it at start.
struct DecodeLoop {
    name: String,
    path: PathBuf,
    channel: Arc<FrameChannel>,
    fallback_fps: f64,
    counters: Arc<SourceCounters>,
}

impl DecodeLoop {
    fn run(self, opener: ReaderOpener, stop: &AtomicBool) {
        let mut reader = match opener() {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(
                    source = %self.name,
                    path = %self.path.display(),
                    error = %e,
                    "Video stream could not be opened; source will produce no frames"
                );
                return;
            }
        };

        let fps = effective_fps(reader.fps(), self.fallback_fps);
        let pacer = FramePacer::from_fps(fps);
        tracing::info!(
            source = %self.name,
            fps,
            dimensions = ?reader.dimensions(),
            "Video stream opened"
        );

        // Back-to-back failures mean the stream has nothing to give right
        // now; pace the retries instead of spinning.
        let mut last_read_failed = false;
        while !stop.load(Ordering::Relaxed) {
            match reader.read_frame() {
                Some(frame) => {
                    last_read_failed = false;
                    self.channel.publish(frame);
                    self.counters.frame_emitted();
                    pacer.wait(stop);
                }
                None => {
                    self.counters.rewound();
                    tracing::debug!(source = %self.name, "End of stream or read failure; rewinding");
                    if let Err(e) = reader.rewind() {
                        tracing::warn!(source = %self.name, error = %e, "Rewind failed; retrying");
                        pacer.wait(stop);
                    } else if last_read_failed {
                        pacer.wait(stop);
                    }
                    last_read_failed = true;
                }
            }
        }

        drop(reader);
        tracing::info!(
            source = %self.name,
            frames = self.counters.snapshot().frames_emitted,
            "Video source stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmix_frame::{Frame, PixelLayout};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Yields `frame_count` frames whose pixels carry their 1-based index,
    /// then fails until rewound.
    ///
    /// `glitch_before` makes the read of that frame number fail once, as a
    /// transient decode error would. The first `failing_rewinds` rewinds
    /// return an error.
    struct ScriptedReader {
        frame_count: u8,
        next: u8,
        fps: Option<f64>,
        glitch_before: Option<u8>,
        failing_rewinds: u32,
        produced: Arc<Mutex<Vec<u8>>>,
    }

    #[derive(Clone, Copy, Default)]
    struct Faults {
        glitch_before: Option<u8>,
        failing_rewinds: u32,
    }

    impl FrameReader for ScriptedReader {
        fn fps(&self) -> Option<f64> {
            self.fps
        }

        fn dimensions(&self) -> Option<(u32, u32)> {
            Some((2, 2))
        }

        fn read_frame(&mut self) -> Option<Frame> {
            if self.next >= self.frame_count {
                return None;
            }
            if self.glitch_before.is_some_and(|n| n == self.next + 1) {
                self.glitch_before = None;
                return None;
            }
            self.next += 1;
            self.produced.lock().unwrap().push(self.next);
            Frame::filled(2, 2, PixelLayout::Bgr, [self.next; 3]).ok()
        }

        fn rewind(&mut self) -> ColmixResult<()> {
            if self.failing_rewinds > 0 {
                self.failing_rewinds -= 1;
                return Err(ColmixError::media("seek rejected"));
            }
            self.next = 0;
            Ok(())
        }
    }

    fn scripted_source(
        frame_count: u8,
        fps: Option<f64>,
        channel: Arc<FrameChannel>,
        liveness: LivenessTracker,
    ) -> (DecodingSource, Arc<Mutex<Vec<u8>>>) {
        faulty_source(frame_count, fps, Faults::default(), channel, liveness)
    }

    fn faulty_source(
        frame_count: u8,
        fps: Option<f64>,
        faults: Faults,
        channel: Arc<FrameChannel>,
        liveness: LivenessTracker,
    ) -> (DecodingSource, Arc<Mutex<Vec<u8>>>) {
        let produced = Arc::new(Mutex::new(Vec::new()));
        let log = produced.clone();
        let opener: ReaderOpener = Box::new(move || {
            Ok(Box::new(ScriptedReader {
                frame_count,
                next: 0,
                fps,
                glitch_before: faults.glitch_before,
                failing_rewinds: faults.failing_rewinds,
                produced: log,
            }) as Box<dyn FrameReader>)
        });
        let source = DecodingSource::with_opener(
            "scripted",
            Path::new("scripted.mp4"),
            channel,
            30.0,
            liveness,
            opener,
        );
        (source, produced)
    }

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) {
        let started = Instant::now();
        while !done() && started.elapsed() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_ten_frame_stream_loops_through_a_thousand_reads() {
        let channel = Arc::new(FrameChannel::new("video"));
        let (mut source, produced) =
            scripted_source(10, Some(20_000.0), channel.clone(), LivenessTracker::new());

        source.start().unwrap();
        wait_until(Duration::from_secs(30), || produced.lock().unwrap().len() >= 1000);
        source.stop();

        let produced = produced.lock().unwrap();
        assert!(produced.len() >= 1000, "only {} frames read", produced.len());
        for (i, counter) in produced.iter().enumerate() {
            assert_eq!(*counter as usize, i % 10 + 1, "frame {i} out of sequence");
        }

        let stats = source.stats();
        assert_eq!(stats.frames_emitted as usize, produced.len());
        assert!(stats.rewinds >= 99);
        assert_eq!(source.state(), WorkerState::Joined);
    }

    #[test]
    fn test_published_frames_reach_the_channel() {
        let channel = Arc::new(FrameChannel::new("video"));
        let (mut source, _) = scripted_source(3, Some(500.0), channel.clone(), LivenessTracker::new());
        source.start().unwrap();
        let frame = channel.take(Duration::from_secs(2)).into_frame();
        source.stop();

        let frame = frame.expect("a frame should be published");
        let value = frame.pixel(0, 0).unwrap()[0];
        assert!((1..=3).contains(&value));
    }

    #[test]
    fn test_unopenable_stream_exits_silently() {
        let channel = Arc::new(FrameChannel::new("video"));
        let liveness = LivenessTracker::new();
        let opener: ReaderOpener =
            Box::new(|| Err(ColmixError::media("no such stream")));
        let mut source = DecodingSource::with_opener(
            "broken",
            Path::new("broken.mp4"),
            channel.clone(),
            30.0,
            liveness.clone(),
            opener,
        );

        source.start().unwrap();
        wait_until(Duration::from_secs(5), || liveness.live() == 0);
        assert_eq!(liveness.live(), 0);
        assert!(!channel.has_pending());

        source.stop();
        assert_eq!(source.stats(), SourceStats::default());
    }

    #[test]
    fn test_stop_is_idempotent_and_start_is_single_use() {
        let channel = Arc::new(FrameChannel::new("video"));
        let (mut source, _) = scripted_source(5, None, channel, LivenessTracker::new());
        source.stop();
        source.stop();
        assert_eq!(source.state(), WorkerState::Joined);
        assert!(source.start().is_err());
    }

    #[test]
    fn test_unreported_fps_falls_back_to_default_pacing() {
        let channel = Arc::new(FrameChannel::new("video"));
        let (mut source, produced) = scripted_source(10, Some(0.0), channel, LivenessTracker::new());
        source.start().unwrap();
        std::thread::sleep(Duration::from_millis(200));
        source.stop();
        // 30 fps over 200 ms is about 6 frames; unpaced would be thousands.
        let count = produced.lock().unwrap().len();
        assert!((1..=20).contains(&count), "read {count} frames");
    }

    #[test]
    fn test_failed_rewinds_are_retried_until_the_stream_resumes() {
        let channel = Arc::new(FrameChannel::new("video"));
        let liveness = LivenessTracker::new();
        let faults = Faults {
            glitch_before: None,
            failing_rewinds: 3,
        };
        let (mut source, produced) =
            faulty_source(2, Some(1000.0), faults, channel.clone(), liveness.clone());

        source.start().unwrap();
        wait_until(Duration::from_secs(10), || produced.lock().unwrap().len() >= 6);

        // Still running after every failed rewind.
        assert_eq!(liveness.live(), 1);
        assert_eq!(source.state(), WorkerState::Running);
        source.stop();

        let produced = produced.lock().unwrap();
        assert!(produced.len() >= 6, "only {} frames read", produced.len());
        for (i, counter) in produced.iter().enumerate() {
            assert_eq!(*counter as usize, i % 2 + 1, "frame {i} out of sequence");
        }
        // Three rejected rewinds plus at least two that worked.
        assert!(source.stats().rewinds >= 5, "rewinds {}", source.stats().rewinds);
        assert!(source.stats().frames_emitted >= 6);
        assert_eq!(liveness.live(), 0);
    }

    #[test]
    fn test_mid_stream_read_failure_restarts_from_first_frame() {
        let channel = Arc::new(FrameChannel::new("video"));
        let liveness = LivenessTracker::new();
        let faults = Faults {
            glitch_before: Some(5),
            failing_rewinds: 0,
        };
        let (mut source, produced) =
            faulty_source(10, Some(5000.0), faults, channel, liveness.clone());

        source.start().unwrap();
        wait_until(Duration::from_secs(10), || produced.lock().unwrap().len() >= 34);
        assert_eq!(liveness.live(), 1);
        source.stop();

        let produced = produced.lock().unwrap();
        assert!(produced.len() >= 34, "only {} frames read", produced.len());
        assert_eq!(&produced[..4], &[1, 2, 3, 4]);
        // After the glitch the stream plays from the top and keeps looping.
        for (i, counter) in produced[4..].iter().enumerate() {
            assert_eq!(*counter as usize, i % 10 + 1, "frame {} out of sequence", i + 4);
        }
        assert!(source.stats().rewinds >= 3);
    }
}
