//! Output resource abstraction
//!
//! Abstracts the decode/output backend that actually produces sound
//! (a platform media player, a CPAL stream, a test double).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Handle to one opened output resource
///
/// Every `open` yields a fresh handle. A handle is never reused after
/// `release`, which lets late notifications for a released handle be told
/// apart from those of the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputHandle(u64);

impl OutputHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of preparing an opened resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Ready to start right away
    Ready,

    /// Preparation continues in the background; the backend reports back
    /// through [`EnvironmentNotifier::output_prepared`](crate::EnvironmentNotifier::output_prepared)
    /// or [`EnvironmentNotifier::output_failed`](crate::EnvironmentNotifier::output_failed)
    Pending,
}

/// Platform-agnostic output resource
///
/// Implementors own the actual decoders and audio devices. Calls are made
/// from the session thread only. `open` and `prepare` must fail fast; any
/// error they return is treated as a [`PlaybackError::Resource`](crate::PlaybackError::Resource).
pub trait OutputResource: Send {
    /// Open the audio resource named by `locator`
    fn open(&mut self, locator: &str) -> Result<OutputHandle>;

    /// Prepare an opened resource for playback
    fn prepare(&mut self, _handle: OutputHandle) -> Result<Readiness> {
        Ok(Readiness::Ready)
    }

    /// Start or resume output
    fn start(&mut self, handle: OutputHandle);

    /// Halt output, keeping the resource
    fn pause(&mut self, handle: OutputHandle);

    /// Stop output and free the resource; the handle is dead afterwards
    fn release(&mut self, handle: OutputHandle);

    /// Move the playhead
    fn seek(&mut self, handle: OutputHandle, position: Duration);

    /// Set per-channel volume (0.0-1.0)
    fn set_volume(&mut self, handle: OutputHandle, left: f32, right: f32);

    /// Current playhead position
    ///
    /// Only trusted while output is running.
    fn position(&self, handle: OutputHandle) -> Duration;
}

/// Output double for unit tests
///
/// Clones share one [`DummyState`], so a test can keep a clone and inspect
/// what the engine did with the boxed original.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct DummyOutput {
    inner: std::sync::Arc<std::sync::Mutex<DummyState>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct DummyState {
    next_handle: u64,
    pub opens: Vec<String>,
    pub released: Vec<OutputHandle>,
    pub seeks: Vec<(OutputHandle, Duration)>,
    pub positions: std::collections::HashMap<OutputHandle, Duration>,
    pub volumes: Vec<(f32, f32)>,
    pub running: Option<OutputHandle>,
    pub fail_open: bool,
    pub pending_prepare: bool,
}

#[cfg(test)]
impl DummyOutput {
    pub fn state(&self) -> std::sync::MutexGuard<'_, DummyState> {
        self.inner.lock().unwrap()
    }

    /// Move the playhead of `handle` as if audio had been rendered
    pub fn advance(&self, handle: OutputHandle, position: Duration) {
        self.state().positions.insert(handle, position);
    }
}

#[cfg(test)]
impl OutputResource for DummyOutput {
    fn open(&mut self, locator: &str) -> Result<OutputHandle> {
        let mut state = self.state();
        if state.fail_open {
            return Err(crate::error::PlaybackError::resource(locator, "file not found"));
        }
        state.next_handle += 1;
        let handle = OutputHandle::new(state.next_handle);
        state.opens.push(locator.to_string());
        state.positions.insert(handle, Duration::ZERO);
        Ok(handle)
    }

    fn prepare(&mut self, _handle: OutputHandle) -> Result<Readiness> {
        Ok(if self.state().pending_prepare {
            Readiness::Pending
        } else {
            Readiness::Ready
        })
    }

    fn start(&mut self, handle: OutputHandle) {
        self.state().running = Some(handle);
    }

    fn pause(&mut self, _handle: OutputHandle) {
        self.state().running = None;
    }

    fn release(&mut self, handle: OutputHandle) {
        let mut state = self.state();
        state.positions.remove(&handle);
        state.released.push(handle);
        if state.running == Some(handle) {
            state.running = None;
        }
    }

    fn seek(&mut self, handle: OutputHandle, position: Duration) {
        let mut state = self.state();
        state.seeks.push((handle, position));
        state.positions.insert(handle, position);
    }

    fn set_volume(&mut self, _handle: OutputHandle, left: f32, right: f32) {
        self.state().volumes.push((left, right));
    }

    fn position(&self, handle: OutputHandle) -> Duration {
        self.state().positions.get(&handle).copied().unwrap_or_default()
    }
}
