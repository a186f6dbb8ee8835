//! Still-image producer.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use colmix_common::clock::FramePacer;
use colmix_common::error::{ColmixError, ColmixResult};
use colmix_common::worker::{LivenessTracker, Worker, WorkerState};
use colmix_frame::{Frame, FrameChannel, PixelLayout};

use crate::source::{FrameSource, SourceCounters, SourceStats};

/// Decode an image file into a BGR frame.
pub fn load_image_frame(path: &Path) -> ColmixResult<Frame> {
    let image = image::open(path).map_err(|e| ColmixError::image_decode(path, e.to_string()))?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let frame = Frame::new(width, height, PixelLayout::Rgb, rgb.into_raw())
        .map_err(|e| ColmixError::image_decode(path, e.to_string()))?;
    Ok(frame.into_layout(PixelLayout::Bgr))
}

/// Re-emits one decoded image at a fixed rate until stopped.
pub struct RepeatingImageSource {
    name: String,
    path: PathBuf,
    channel: Arc<FrameChannel>,
    image: Frame,
    fps: u32,
    worker: Worker,
    counters: Arc<SourceCounters>,
}

impl RepeatingImageSource {
    /// Decode `path` now. Fails if the image cannot be decoded; there is no
    /// fallback frame to emit instead.
    pub fn open(
        name: &str,
        path: &Path,
        channel: Arc<FrameChannel>,
        fps: u32,
        liveness: LivenessTracker,
    ) -> ColmixResult<Self> {
        let image = load_image_frame(path)?;
        tracing::debug!(
            source = name,
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Decoded still image"
        );
        Ok(Self::from_frame(name, path, image, channel, fps, liveness))
    }

    /// A source repeating an already decoded frame.
    pub fn from_frame(
        name: &str,
        path: &Path,
        image: Frame,
        channel: Arc<FrameChannel>,
        fps: u32,
        liveness: LivenessTracker,
    ) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            channel,
            image,
            fps: fps.max(1),
            worker: Worker::new(name, liveness),
            counters: Arc::new(SourceCounters::default()),
        }
    }

    /// The decoded image this source repeats.
    pub fn image(&self) -> &Frame {
        &self.image
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl FrameSource for RepeatingImageSource {
    fn start(&mut self) -> ColmixResult<()> {
        let image = self.image.clone();
        let channel = self.channel.clone();
        let counters = self.counters.clone();
        let pacer = FramePacer::from_fps(self.fps as f64);
        let name = self.name.clone();

        tracing::info!(source = %self.name, path = %self.path.display(), fps = self.fps, "Starting image source");
        self.worker.start(move |stop| {
            while !stop.load(Ordering::Relaxed) {
                // Each emission is a private copy; the compositor owns it.
                channel.publish(image.clone());
                counters.frame_emitted();
                pacer.wait(&stop);
            }
            tracing::info!(
                source = %name,
                frames = counters.snapshot().frames_emitted,
                "Image source stopped"
            );
        })
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
