//! The frame production contract and the source factory.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use colmix_common::config::MixerDefaults;
use colmix_common::error::ColmixResult;
use colmix_common::worker::{LivenessTracker, WorkerState};
use colmix_frame::{FrameChannel, MediaKind};
use serde::Serialize;

use crate::decoding::DecodingSource;
use crate::image_source::RepeatingImageSource;

/// Trait for a frame producer bound to one channel.
pub trait FrameSource: Send {
    /// Spawn the production loop. A source starts at most once.
    fn start(&mut self) -> ColmixResult<()>;

    /// Stop the loop and block until it has exited and released its
    /// decoding resources. Safe to call repeatedly.
    fn stop(&mut self);

    /// Lifecycle state of the production thread.
    fn state(&self) -> WorkerState;

    /// Source label for logging (e.g. `source1`).
    fn name(&self) -> &str;

    /// Input path.
    fn path(&self) -> &Path;

    /// Production counters.
    fn stats(&self) -> SourceStats;
}

/// Counters reported by a frame source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    /// Frames published to the channel.
    pub frames_emitted: u64,
    /// Times the stream was rewound after end-of-stream or a read failure.
    pub rewinds: u64,
}

/// Counters shared between a source and its worker thread.
#[derive(Debug, Default)]
pub(crate) struct SourceCounters {
    frames_emitted: AtomicU64,
    rewinds: AtomicU64,
}

impl SourceCounters {
    pub(crate) fn frame_emitted(&self) {
        self.frames_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rewound(&self) {
        self.rewinds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SourceStats {
        SourceStats {
            frames_emitted: self.frames_emitted.load(Ordering::Relaxed),
            rewinds: self.rewinds.load(Ordering::Relaxed),
        }
    }
}

/// One of the two concrete producers, chosen by [`open_source`].
pub enum FrameSourceKind {
    Decoding(DecodingSource),
    Image(RepeatingImageSource),
}

impl FrameSourceKind {
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::Decoding(_) => MediaKind::Video,
            Self::Image(_) => MediaKind::Image,
        }
    }

    fn inner(&self) -> &dyn FrameSource {
        match self {
            Self::Decoding(source) => source,
            Self::Image(source) => source,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FrameSource {
        match self {
            Self::Decoding(source) => source,
            Self::Image(source) => source,
        }
    }
}

impl FrameSource for FrameSourceKind {
    fn start(&mut self) -> ColmixResult<()> {
        self.inner_mut().start()
    }

    fn stop(&mut self) {
        self.inner_mut().stop()
    }

    fn state(&self) -> WorkerState {
        self.inner().state()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn path(&self) -> &Path {
        self.inner().path()
    }

    fn stats(&self) -> SourceStats {
        self.inner().stats()
    }
}

/// Build the producer for `path`, classified by file extension.
///
/// Video paths never fail here: the stream is opened on the worker thread and
/// an unopenable stream simply produces nothing. Image paths are decoded now,
/// so an undecodable image fails before any thread exists.
pub fn open_source(
    name: &str,
    path: &Path,
    channel: Arc<FrameChannel>,
    defaults: &MixerDefaults,
    liveness: &LivenessTracker,
) -> ColmixResult<FrameSourceKind> {
    let kind = MediaKind::classify_with(path, &defaults.video_extensions);
    tracing::debug!(source = name, path = %path.display(), ?kind, "Classified input");

    match kind {
        MediaKind::Video => Ok(FrameSourceKind::Decoding(DecodingSource::new(
            name,
            path,
            channel,
            defaults.fallback_video_fps,
            liveness.clone(),
        ))),
        MediaKind::Image => Ok(FrameSourceKind::Image(RepeatingImageSource::open(
            name,
            path,
            channel,
            defaults.image_fps,
            liveness.clone(),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmix_common::error::ColmixError;

    #[test]
    fn test_video_extension_yields_decoding_source_without_opening() {
        let channel = Arc::new(FrameChannel::new("t"));
        let path = std::env::temp_dir().join("colmix_factory_not_there.MOV");
        let source = open_source(
            "source1",
            &path,
            channel,
            &MixerDefaults::default(),
            &LivenessTracker::new(),
        )
        .unwrap();
        assert_eq!(source.media_kind(), MediaKind::Video);
        assert_eq!(source.state(), WorkerState::Created);
        assert_eq!(source.name(), "source1");
    }

    #[test]
    fn test_undecodable_image_fails_at_construction() {
        let channel = Arc::new(FrameChannel::new("t"));
        let path = std::env::temp_dir().join("colmix_factory_not_there.png");
        let result = open_source(
            "source2",
            &path,
            channel,
            &MixerDefaults::default(),
            &LivenessTracker::new(),
        );
        assert!(matches!(result, Err(ColmixError::ImageDecode { .. })));
    }
}
