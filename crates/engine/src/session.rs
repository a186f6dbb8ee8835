//! One mixing session: two sources, two channels, one compositor.

use std::path::Path;
use std::sync::Arc;

use colmix_common::clock::SessionClock;
use colmix_common::config::MixerDefaults;
use colmix_common::error::ColmixResult;
use colmix_common::worker::{LivenessTracker, WorkerState};
use colmix_compositor::{Compositor, CompositorConfig, FrameSink};
use colmix_frame::FrameChannel;
use colmix_media_source::{open_source, FrameSource, FrameSourceKind};

use crate::stats::{SessionStats, SourceReport};

/// State of a mixing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built, no thread started.
    Ready,
    /// All three workers started.
    Running,
    /// Every worker joined; terminal.
    Stopped,
}

/// Everything one `start` builds. Never reused across restarts.
pub struct PipelineSession {
    id: u64,
    state: SessionState,
    clock: Option<SessionClock>,
    sources: [FrameSourceKind; 2],
    channels: [Arc<FrameChannel>; 2],
    compositor: Compositor,
}

impl PipelineSession {
    /// Build both sources and the compositor without starting anything.
    ///
    /// Fails if either source cannot be constructed (an undecodable still
    /// image); nothing is left running in that case.
    pub fn build(
        id: u64,
        path1: &Path,
        path2: &Path,
        defaults: &MixerDefaults,
        sink: Arc<dyn FrameSink>,
        liveness: &LivenessTracker,
    ) -> ColmixResult<Self> {
        let channels = [
            Arc::new(FrameChannel::new("channel1")),
            Arc::new(FrameChannel::new("channel2")),
        ];
        let sources = [
            open_source("source1", path1, channels[0].clone(), defaults, liveness)?,
            open_source("source2", path2, channels[1].clone(), defaults, liveness)?,
        ];
        let compositor = Compositor::new(
            channels[0].clone(),
            channels[1].clone(),
            sink,
            CompositorConfig::from(defaults),
            liveness.clone(),
        );

        Ok(Self {
            id,
            state: SessionState::Ready,
            clock: None,
            sources,
            channels,
            compositor,
        })
    }

    /// Start the compositor and both sources. On failure everything already
    /// started is stopped again before the error is returned.
    pub fn start(&mut self) -> ColmixResult<()> {
        if self.state != SessionState::Ready {
            return Ok(());
        }
        self.clock = Some(SessionClock::start());
        self.state = SessionState::Running;

        let started = self
            .compositor
            .start()
            .and_then(|_| self.sources[0].start())
            .and_then(|_| self.sources[1].start());
        if let Err(e) = started {
            tracing::error!(session = self.id, error = %e, "Session failed to start");
            self.stop();
            return Err(e);
        }

        tracing::info!(
            session = self.id,
            source1 = %self.sources[0].path().display(),
            source2 = %self.sources[1].path().display(),
            "Mixing session started"
        );
        Ok(())
    }

    /// Stop producers, then close and drain the channels, then stop the
    /// compositor. Blocks until all three threads are joined. Idempotent.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        for source in &mut self.sources {
            source.stop();
        }
        for channel in &self.channels {
            channel.close();
            channel.clear();
        }
        self.compositor.stop();
        self.state = SessionState::Stopped;
        tracing::info!(session = self.id, "Mixing session stopped");
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Worker states in the order source1, source2, compositor.
    pub fn worker_states(&self) -> [WorkerState; 3] {
        [
            self.sources[0].state(),
            self.sources[1].state(),
            self.compositor.state(),
        ]
    }

    pub fn stats(&self) -> SessionStats {
        let report = |source: &FrameSourceKind| SourceReport {
            name: source.name().to_string(),
            path: source.path().to_path_buf(),
            kind: source.media_kind(),
            stats: source.stats(),
        };
        SessionStats {
            session_id: self.id,
            started_at: self
                .clock
                .as_ref()
                .map(|c| c.epoch_wall().to_string())
                .unwrap_or_default(),
            uptime_secs: self.clock.as_ref().map_or(0.0, SessionClock::elapsed_secs),
            sources: [report(&self.sources[0]), report(&self.sources[1])],
            channels: [self.channels[0].stats(), self.channels[1].stats()],
            compositor: self.compositor.stats(),
        }
    }
}

impl Drop for PipelineSession {
    fn drop(&mut self) {
        self.stop();
    }
}
