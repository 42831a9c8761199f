//! Simulated output resource
//!
//! Produces no sound; keeps a wall clock per opened item so positions advance
//! in real time while "playing". A ticker thread reports items that run past
//! their duration as naturally completed.

use cadence_playback::{
    EnvironmentNotifier, OutputHandle, OutputResource, PlaybackError, Result, TrackMetadata,
};
use crossbeam_channel::{bounded, select, tick, Sender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug)]
struct Clip {
    duration: Duration,
    offset: Duration,
    started_at: Option<Instant>,
    volume: (f32, f32),
}

impl Clip {
    fn position(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started_at) => (self.offset + now.duration_since(started_at)).min(self.duration),
            None => self.offset,
        }
    }

    fn halt(&mut self, now: Instant) {
        self.offset = self.position(now);
        self.started_at = None;
    }
}

#[derive(Debug, Default)]
struct ClockState {
    durations: HashMap<String, Duration>,
    next_handle: u64,
    clips: HashMap<OutputHandle, Clip>,
}

/// Wall-clock output resource
///
/// Clones share state, so the ticker and the session can both hold one.
#[derive(Debug, Clone, Default)]
pub struct ClockOutput {
    inner: Arc<Mutex<ClockState>>,
}

impl ClockOutput {
    /// Output able to open the locators of `tracks`
    pub fn new(tracks: &[TrackMetadata]) -> Self {
        let durations = tracks
            .iter()
            .map(|track| (track.locator.clone(), track.duration))
            .collect();

        Self {
            inner: Arc::new(Mutex::new(ClockState {
                durations,
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Volume last set on `handle`
    pub fn volume(&self, handle: OutputHandle) -> Option<(f32, f32)> {
        self.state().clips.get(&handle).map(|clip| clip.volume)
    }

    /// Number of resources currently held open
    pub fn open_count(&self) -> usize {
        self.state().clips.len()
    }

    /// Halt every running clip that reached its end, returning their handles
    pub fn collect_finished(&self) -> Vec<OutputHandle> {
        let now = Instant::now();
        let mut state = self.state();

        state
            .clips
            .iter_mut()
            .filter(|(_, clip)| clip.started_at.is_some() && clip.position(now) >= clip.duration)
            .map(|(handle, clip)| {
                clip.halt(now);
                *handle
            })
            .collect()
    }

    /// Start a thread posting completions to `notifier` every `interval`
    pub fn spawn_ticker(
        &self,
        notifier: EnvironmentNotifier,
        interval: Duration,
    ) -> std::io::Result<Ticker> {
        let output = self.clone();
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let thread = thread::Builder::new()
            .name("cadence-clock".to_string())
            .spawn(move || {
                let ticks = tick(interval);
                loop {
                    select! {
                        recv(ticks) -> _ => {
                            for handle in output.collect_finished() {
                                debug!(%handle, "Clip reached its end");
                                if notifier.output_completed(handle).is_err() {
                                    return;
                                }
                            }
                        }
                        recv(stop_rx) -> _ => return,
                    }
                }
            })?;

        Ok(Ticker {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

impl OutputResource for ClockOutput {
    fn open(&mut self, locator: &str) -> Result<OutputHandle> {
        let mut state = self.state();
        let duration = *state
            .durations
            .get(locator)
            .ok_or_else(|| PlaybackError::resource(locator, "not in library"))?;

        state.next_handle += 1;
        let handle = OutputHandle::new(state.next_handle);
        state.clips.insert(
            handle,
            Clip {
                duration,
                offset: Duration::ZERO,
                started_at: None,
                volume: (1.0, 1.0),
            },
        );
        trace!(%handle, locator, "Opened clip");
        Ok(handle)
    }

    fn start(&mut self, handle: OutputHandle) {
        if let Some(clip) = self.state().clips.get_mut(&handle) {
            if clip.started_at.is_none() {
                clip.started_at = Some(Instant::now());
            }
        }
    }

    fn pause(&mut self, handle: OutputHandle) {
        if let Some(clip) = self.state().clips.get_mut(&handle) {
            clip.halt(Instant::now());
        }
    }

    fn release(&mut self, handle: OutputHandle) {
        self.state().clips.remove(&handle);
    }

    fn seek(&mut self, handle: OutputHandle, position: Duration) {
        if let Some(clip) = self.state().clips.get_mut(&handle) {
            clip.offset = position.min(clip.duration);
            if clip.started_at.is_some() {
                clip.started_at = Some(Instant::now());
            }
        }
    }

    fn set_volume(&mut self, handle: OutputHandle, left: f32, right: f32) {
        if let Some(clip) = self.state().clips.get_mut(&handle) {
            clip.volume = (left, right);
        }
    }

    fn position(&self, handle: OutputHandle) -> Duration {
        self.state()
            .clips
            .get(&handle)
            .map(|clip| clip.position(Instant::now()))
            .unwrap_or_default()
    }
}

/// Running completion ticker, stopped on drop
#[derive(Debug)]
pub struct Ticker {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // Disconnecting the stop channel ends the loop
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}
