//! The mixer's control surface.
//!
//! Two path slots and two actions. Loading a path only records it; nothing
//! runs until `start_mixing` is called with both slots set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colmix_common::config::MixerDefaults;
use colmix_common::error::ColmixResult;
use colmix_compositor::FrameSink;

use crate::controller::PipelineController;
use crate::stats::SessionStats;

pub struct MixerControl {
    source1: Option<PathBuf>,
    source2: Option<PathBuf>,
    controller: PipelineController,
}

impl MixerControl {
    pub fn new(defaults: MixerDefaults, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            source1: None,
            source2: None,
            controller: PipelineController::new(defaults, sink),
        }
    }

    pub fn load_source1(&mut self, path: impl Into<PathBuf>) {
        self.source1 = Some(path.into());
    }

    pub fn load_source2(&mut self, path: impl Into<PathBuf>) {
        self.source2 = Some(path.into());
    }

    pub fn source1(&self) -> Option<&Path> {
        self.source1.as_deref()
    }

    pub fn source2(&self) -> Option<&Path> {
        self.source2.as_deref()
    }

    /// (Re)start mixing the loaded sources. Returns `Ok(false)` without
    /// touching the pipeline if either source is still unset.
    pub fn start_mixing(&mut self) -> ColmixResult<bool> {
        let (Some(path1), Some(path2)) = (&self.source1, &self.source2) else {
            tracing::info!("Load both sources before mixing");
            return Ok(false);
        };
        self.controller.start(path1, path2)?;
        Ok(self.controller.is_running())
    }

    pub fn stop_all(&mut self) {
        self.controller.stop();
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn stats(&self) -> Option<SessionStats> {
        self.controller.stats()
    }

    pub fn controller(&self) -> &PipelineController {
        &self.controller
    }
}
