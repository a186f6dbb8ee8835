//! Pipeline lifecycle controller.

use std::path::Path;
use std::sync::Arc;

use colmix_common::config::MixerDefaults;
use colmix_common::error::ColmixResult;
use colmix_common::worker::LivenessTracker;
use colmix_compositor::FrameSink;

use crate::session::PipelineSession;
use crate::stats::SessionStats;

/// Owns at most one active [`PipelineSession`] and enforces restart discipline:
/// the previous session is fully joined before the next one is built.
pub struct PipelineController {
    defaults: MixerDefaults,
    sink: Arc<dyn FrameSink>,
    liveness: LivenessTracker,
    session: Option<PipelineSession>,
    sessions_started: u64,
}

impl PipelineController {
    pub fn new(defaults: MixerDefaults, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            defaults,
            sink,
            liveness: LivenessTracker::new(),
            session: None,
            sessions_started: 0,
        }
    }

    /// Start mixing `path1` with `path2`, replacing any active session.
    ///
    /// Does nothing if either path is empty. Returns an error only when a
    /// source cannot be constructed (an undecodable still image), in which
    /// case no session is active afterwards. A video that cannot be opened
    /// is not an error here; that source simply never produces frames.
    pub fn start(&mut self, path1: &Path, path2: &Path) -> ColmixResult<()> {
        if path1.as_os_str().is_empty() || path2.as_os_str().is_empty() {
            tracing::debug!("Start ignored: both sources must be set");
            return Ok(());
        }

        self.defaults.validate()?;
        self.stop();

        let id = self.sessions_started + 1;
        let mut session = PipelineSession::build(
            id,
            path1,
            path2,
            &self.defaults,
            self.sink.clone(),
            &self.liveness,
        )?;
        session.start()?;

        self.sessions_started = id;
        self.session = Some(session);
        Ok(())
    }

    /// Stop the active session, blocking until all of its threads have
    /// exited. Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(PipelineSession::is_running)
    }

    /// Worker threads still executing, across every session this controller
    /// has created.
    pub fn live_workers(&self) -> usize {
        self.liveness.live()
    }

    /// Sessions successfully started so far.
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Counters of the active session.
    pub fn stats(&self) -> Option<SessionStats> {
        self.session.as_ref().map(PipelineSession::stats)
    }

    pub fn defaults(&self) -> &MixerDefaults {
        &self.defaults
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmix_compositor::LatestFrameSink;

    #[test]
    fn test_empty_path_is_a_no_op() {
        let mut controller =
            PipelineController::new(MixerDefaults::default(), Arc::new(LatestFrameSink::new()));
        controller.start(Path::new(""), Path::new("b.png")).unwrap();
        controller.start(Path::new("a.png"), Path::new("")).unwrap();
        assert!(!controller.is_running());
        assert_eq!(controller.sessions_started(), 0);
        assert!(controller.stats().is_none());
    }

    #[test]
    fn test_stop_before_start_is_harmless() {
        let mut controller =
            PipelineController::new(MixerDefaults::default(), Arc::new(LatestFrameSink::new()));
        controller.stop();
        controller.stop();
        assert_eq!(controller.live_workers(), 0);
    }
}
