//! Stoppable worker threads.
//!
//! Every producer and the compositor run on a dedicated OS thread driven by a
//! cooperative stop flag. A [`Worker`] walks a fixed lifecycle:
//!
//! ```text
//! Created ──start()──▶ Running ──request_stop()──▶ StopRequested ──join──▶ Joined
//! ```
//!
//! `stop()` blocks until the thread has exited, so nothing a worker owns
//! outlives the call. A [`LivenessTracker`] counts threads that are still
//! executing; tests use it to prove that no thread survives a restart.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{ColmixError, ColmixResult};

/// Lifecycle state of a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, thread not spawned yet.
    Created,
    /// Thread spawned and looping.
    Running,
    /// Stop flag raised, thread not yet joined.
    StopRequested,
    /// Thread joined; terminal.
    Joined,
}

/// Counts worker threads whose body is still executing.
#[derive(Debug, Clone, Default)]
pub struct LivenessTracker {
    live: Arc<AtomicUsize>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn enter(&self) -> LiveGuard {
        self.live.fetch_add(1, Ordering::SeqCst);
        LiveGuard(self.live.clone())
    }
}

/// Decrements the live count when the worker body returns or unwinds.
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A named thread with a cooperative stop flag and a blocking `stop()`.
pub struct Worker {
    name: String,
    state: WorkerState,
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    liveness: LivenessTracker,
}

impl Worker {
    /// Create a worker that will report into `liveness` once started.
    pub fn new(name: impl Into<String>, liveness: LivenessTracker) -> Self {
        Self {
            name: name.into(),
            state: WorkerState::Created,
            stop_flag: Arc::new(AtomicBool::new(false)),
            handle: None,
            liveness,
        }
    }

    /// Worker name, also used for the OS thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Spawn the worker thread running `body`.
    ///
    /// The body receives the stop flag and must return soon after it is set.
    pub fn start<F>(&mut self, body: F) -> ColmixResult<()>
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        if self.state != WorkerState::Created {
            return Err(ColmixError::pipeline(format!(
                "worker {} cannot start from state {:?}",
                self.name, self.state
            )));
        }

        // Counted before spawning so a caller never observes a running worker
        // that is missing from the live count.
        let guard = self.liveness.enter();
        let stop = self.stop_flag.clone();
        let handle = std::thread::Builder::new()
            .name(format!("colmix-{}", self.name))
            .spawn(move || {
                let _guard = guard;
                body(stop);
            })
            .map_err(|e| {
                ColmixError::pipeline(format!("Failed to spawn {} worker: {e}", self.name))
            })?;

        self.handle = Some(handle);
        self.state = WorkerState::Running;
        tracing::debug!(worker = %self.name, "Worker started");
        Ok(())
    }

    /// Raise the stop flag without waiting.
    pub fn request_stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if self.state == WorkerState::Running {
            self.state = WorkerState::StopRequested;
        }
    }

    /// Raise the stop flag and block until the thread has exited.
    /// Calling this more than once, or before `start`, is a no-op.
    pub fn stop(&mut self) {
        if self.state == WorkerState::Joined {
            return;
        }
        self.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(worker = %self.name, "Worker thread panicked");
            }
            tracing::debug!(worker = %self.name, "Worker joined");
        }
        self.state = WorkerState::Joined;
    }

    /// Whether the thread body is still executing.
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}
