//! Playback engine - transport state machine
//!
//! Owns the output resource lifecycle for exactly one current item and the
//! play/pause/stop/seek transitions over [`PlaybackState`]:
//!
//! ```text
//!            play                ready
//!   Idle ─────────► Preparing ─────────► Playing ◄──┐
//!    ▲                 │  ▲                │   │     │ play
//!    │ open failed     │  │ play (reload)  │   ▼     │
//!    └─────────────────┘  └──────────── Stopped  Paused ◄── completion (position 0)
//! ```
//!
//! Every transition is reported to the listeners together with the transport
//! actions derived from the new state.

use crate::{
    error::{PlaybackError, Result},
    events::{Listeners, PlaybackListener},
    focus::{AudioFocusArbiter, FocusChange, FocusDirective, FocusEnvironment, FocusState},
    output::{OutputHandle, OutputResource, Readiness},
    types::{PlayOutcome, PlaybackConfig, PlaybackItem, PlaybackState, TransportActions},
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Whether `requested` must be loaded afresh instead of resuming `previous`
///
/// A different item always needs a reload. So does the same item once it has
/// played to completion: restarting a finished resource without reopening it
/// silently produces no audio on common backends.
pub fn needs_reload(
    previous: Option<&PlaybackItem>,
    requested: &PlaybackItem,
    completed: bool,
) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            completed || previous.id != requested.id || previous.locator != requested.locator
        }
    }
}

/// Transport state machine for a single output
pub struct PlaybackEngine {
    state: PlaybackState,
    config: PlaybackConfig,
    output: Box<dyn OutputResource>,
    focus: AudioFocusArbiter,
    listeners: Listeners,

    // Loaded resource
    handle: Option<OutputHandle>,
    loaded: Option<PlaybackItem>,
    completed: bool,

    // Seek requested while not playing, applied on the next start
    pending_seek: Option<Duration>,

    // Volume requested by the caller, before ducking
    volume: f32,
}

impl PlaybackEngine {
    /// Create new playback engine
    pub fn new(
        config: PlaybackConfig,
        output: Box<dyn OutputResource>,
        focus: Box<dyn FocusEnvironment>,
    ) -> Self {
        Self {
            state: PlaybackState::Idle,
            focus: AudioFocusArbiter::new(focus, config.duck_volume),
            volume: config.default_volume,
            config,
            output,
            listeners: Listeners::default(),
            handle: None,
            loaded: None,
            completed: false,
            pending_seek: None,
        }
    }

    /// Register a listener for state changes
    pub fn add_listener(&mut self, listener: Box<dyn PlaybackListener>) {
        self.listeners.add(listener);
    }

    pub(crate) fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    // ===== Playback Control =====

    /// Play `item`
    ///
    /// Requests audio focus first; a refusal leaves the state untouched and
    /// returns [`PlayOutcome::FocusDenied`]. The output resource is reopened
    /// when [`needs_reload`] says so or when nothing is held. A resource
    /// failure is returned as an error and leaves the engine `Idle` or
    /// `Stopped`, never stuck in `Preparing`.
    pub fn play(&mut self, item: &PlaybackItem) -> Result<PlayOutcome> {
        let reload = self.handle.is_none()
            || needs_reload(self.loaded.as_ref(), item, self.completed);

        if !reload {
            match self.state {
                PlaybackState::Playing { .. } => return Ok(PlayOutcome::AlreadyPlaying),
                PlaybackState::Preparing { .. } => return Ok(PlayOutcome::Preparing),
                _ => {}
            }
        }

        if !self.focus.request_focus() {
            info!(item = %item.id, "Audio focus denied, not starting playback");
            return Ok(PlayOutcome::FocusDenied);
        }

        if reload {
            self.load(item)
        } else {
            self.start_output();
            Ok(PlayOutcome::Started)
        }
    }

    /// Play `item` from its start, reopening the output resource even when
    /// the same item is loaded
    pub fn restart(&mut self, item: &PlaybackItem) -> Result<PlayOutcome> {
        if !self.focus.request_focus() {
            info!(item = %item.id, "Audio focus denied, not restarting playback");
            return Ok(PlayOutcome::FocusDenied);
        }
        self.pending_seek = None;
        self.load(item)
    }

    /// Pause playback
    ///
    /// No-op unless playing. Keeps the output resource, releases focus.
    pub fn pause(&mut self) {
        if self.state.is_playing() {
            self.pause_output();
            self.focus.abandon_focus();
        } else {
            // Paused by a transient focus loss: the user wants it to stay paused
            self.focus.clear_resume();
        }
    }

    /// Stop playback
    ///
    /// Always ends in `Stopped`. Releases the output resource and focus; a
    /// later `play` reloads the item. Supersedes any preparation in flight.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(%handle, "Releasing output resource");
            self.output.release(handle);
        }
        self.pending_seek = None;
        self.focus.abandon_focus();
        self.transition(PlaybackState::Stopped);
    }

    /// Seek within the loaded item
    ///
    /// Ignored when nothing is loaded. While playing the seek is applied at
    /// once; otherwise it is remembered, reported as the current position and
    /// applied when output starts.
    pub fn seek_to(&mut self, position: Duration) {
        let (Some(handle), Some(loaded)) = (self.handle, self.loaded.as_ref()) else {
            debug!(?position, "Ignoring seek, nothing loaded");
            return;
        };
        let position = position.min(loaded.duration);

        match &self.state {
            PlaybackState::Playing { item, rate, .. } => {
                let (item, rate) = (item.clone(), *rate);
                self.output.seek(handle, position);
                self.transition(PlaybackState::Playing {
                    item,
                    position,
                    rate,
                });
            }
            PlaybackState::Paused { item, .. } => {
                let item = item.clone();
                self.pending_seek = Some(position);
                self.transition(PlaybackState::Paused { item, position });
            }
            PlaybackState::Preparing { .. } => {
                self.pending_seek = Some(position);
            }
            PlaybackState::Idle | PlaybackState::Stopped => {}
        }
    }

    /// Set output volume (0.0-1.0) on both channels
    ///
    /// No-op when no output resource is held.
    pub fn set_volume(&mut self, volume: f32) {
        if self.handle.is_none() {
            debug!(volume, "Ignoring volume change, no output resource");
            return;
        }
        if !volume.is_finite() {
            debug!(volume, "Ignoring non-finite volume");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume(self.effective_volume());
    }

    // ===== Environment Notifications =====

    /// The output resource reached the end of the item
    ///
    /// Moves to `Paused` at position 0 so `play` restarts the item at once.
    /// Notifications for any handle other than the current one are stale and
    /// dropped.
    pub fn on_natural_completion(&mut self, handle: OutputHandle) {
        if self.handle != Some(handle) || !self.state.is_playing() {
            debug!(%handle, state = self.state.name(), "Dropping stale completion");
            return;
        }
        let Some(item) = self.loaded.clone() else {
            return;
        };

        info!(item = %item.id, "Playback completed");
        self.completed = true;
        self.pending_seek = None;
        self.focus.abandon_focus();
        self.listeners.completion();
        self.transition(PlaybackState::Paused {
            item,
            position: Duration::ZERO,
        });
    }

    /// Background preparation of `handle` finished
    pub fn on_prepared(&mut self, handle: OutputHandle) {
        if self.handle != Some(handle) || !matches!(self.state, PlaybackState::Preparing { .. }) {
            debug!(%handle, "Dropping stale preparation result");
            return;
        }

        if let FocusState::Transient { .. } = self.focus.state() {
            // Focus went away while preparing; a later gain resumes unless
            // the user paused in the meantime
            if let Some(item) = self.loaded.clone() {
                let position = self.pending_seek.unwrap_or_default();
                self.transition(PlaybackState::Paused { item, position });
            }
            return;
        }

        self.start_output();
    }

    /// Background preparation of `handle` failed
    pub fn on_prepare_failed(&mut self, handle: OutputHandle, reason: &str) -> Result<()> {
        if self.handle != Some(handle) || !matches!(self.state, PlaybackState::Preparing { .. }) {
            debug!(%handle, reason, "Dropping stale preparation failure");
            return Ok(());
        }

        let locator = self
            .loaded
            .as_ref()
            .map(|item| item.locator.clone())
            .unwrap_or_default();
        self.handle = None;
        self.output.release(handle);
        Err(self.abort_load(PlaybackState::Stopped, PlaybackError::resource(locator, reason)))
    }

    /// Apply the focus policy to an environment focus change
    pub fn on_focus_change(&mut self, change: FocusChange) {
        let active = matches!(
            self.state,
            PlaybackState::Playing { .. } | PlaybackState::Preparing { .. }
        );
        let Some(directive) = self.focus.on_focus_change(change, active) else {
            return;
        };

        match directive {
            FocusDirective::Resume => self.resume(),
            FocusDirective::RestoreVolume => self.apply_volume(self.volume),
            FocusDirective::Duck(level) => self.apply_volume(self.volume.min(level)),
            FocusDirective::Pause => {
                if self.state.is_playing() {
                    self.pause_output();
                }
            }
            FocusDirective::Stop => self.stop(),
        }
    }

    /// The output route became noisy (e.g. headphones unplugged)
    pub fn on_audio_becoming_noisy(&mut self) {
        if self.config.pause_on_noisy && self.state.is_playing() {
            info!("Audio becoming noisy, pausing");
            self.pause();
        }
    }

    // ===== State Queries =====

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Transport actions available in the current state
    pub fn actions(&self) -> TransportActions {
        TransportActions::for_state(&self.state)
    }

    /// Current position
    ///
    /// A seek made while not playing wins over the output's own report.
    pub fn position(&self) -> Duration {
        if let Some(position) = self.pending_seek {
            return position;
        }
        match (&self.state, self.handle) {
            (PlaybackState::Playing { .. }, Some(handle)) => self.output.position(handle),
            (state, _) => state.position().unwrap_or_default(),
        }
    }

    pub fn focus_state(&self) -> FocusState {
        self.focus.state()
    }

    /// Volume requested by the caller (before ducking)
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Handle of the held output resource
    pub fn current_handle(&self) -> Option<OutputHandle> {
        self.handle
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Release the output resource and focus without a state transition
    pub(crate) fn release_resources(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.output.release(handle);
        }
        self.focus.abandon_focus();
    }

    // ===== Internals =====

    /// Open, prepare and (when ready) start `item`
    fn load(&mut self, item: &PlaybackItem) -> Result<PlayOutcome> {
        let fallback = match self.state {
            PlaybackState::Idle => PlaybackState::Idle,
            _ => PlaybackState::Stopped,
        };

        if let Some(handle) = self.handle.take() {
            debug!(%handle, "Releasing output resource before reload");
            self.output.release(handle);
            if !matches!(self.state, PlaybackState::Idle | PlaybackState::Stopped) {
                self.transition(PlaybackState::Stopped);
            }
        }

        let same_item = self.loaded.as_ref().map(|loaded| &loaded.id) == Some(&item.id);
        if !same_item {
            self.pending_seek = None;
        }
        self.loaded = Some(item.clone());
        self.completed = false;
        self.transition(PlaybackState::Preparing { item: item.clone() });

        let handle = match self.output.open(&item.locator) {
            Ok(handle) => handle,
            Err(err) => return Err(self.abort_load(fallback, uniform(err, &item.locator))),
        };
        self.handle = Some(handle);
        debug!(%handle, locator = %item.locator, "Opened output resource");

        match self.output.prepare(handle) {
            Ok(Readiness::Ready) => {
                self.start_output();
                Ok(PlayOutcome::Started)
            }
            Ok(Readiness::Pending) => {
                debug!(%handle, "Waiting for output resource to finish preparing");
                Ok(PlayOutcome::Preparing)
            }
            Err(err) => {
                self.handle = None;
                self.output.release(handle);
                Err(self.abort_load(fallback, uniform(err, &item.locator)))
            }
        }
    }

    /// Undo a failed load: forget the item, fall back to `fallback`
    fn abort_load(&mut self, fallback: PlaybackState, err: PlaybackError) -> PlaybackError {
        warn!(error = %err, "Failed to load output resource");
        self.loaded = None;
        self.pending_seek = None;
        self.focus.abandon_focus();
        self.transition(fallback);
        err
    }

    /// Start output on the held resource and enter `Playing`
    fn start_output(&mut self) {
        let (Some(handle), Some(item)) = (self.handle, self.loaded.clone()) else {
            return;
        };

        let position = match self.pending_seek.take() {
            Some(position) => {
                self.output.seek(handle, position);
                position
            }
            None => self.output.position(handle),
        };
        let volume = self.effective_volume();
        self.output.set_volume(handle, volume, volume);
        self.output.start(handle);

        self.transition(PlaybackState::Playing {
            item,
            position,
            rate: self.config.playback_rate,
        });
    }

    /// Halt output and enter `Paused` at the output's position
    fn pause_output(&mut self) {
        let (Some(handle), Some(item)) = (self.handle, self.loaded.clone()) else {
            return;
        };
        self.output.pause(handle);
        let position = self.output.position(handle);
        self.transition(PlaybackState::Paused { item, position });
    }

    /// Restart output paused by a transient focus loss
    fn resume(&mut self) {
        if matches!(self.state, PlaybackState::Paused { .. }) && !self.completed {
            info!("Audio focus regained, resuming playback");
            self.start_output();
        }
    }

    fn effective_volume(&self) -> f32 {
        match self.focus.state() {
            FocusState::Ducked => self.volume.min(self.focus.duck_volume()),
            _ => self.volume,
        }
    }

    fn apply_volume(&mut self, volume: f32) {
        if let Some(handle) = self.handle {
            self.output.set_volume(handle, volume, volume);
        }
    }

    fn transition(&mut self, state: PlaybackState) {
        debug!(from = self.state.name(), to = state.name(), "Playback state changed");
        self.state = state;
        let actions = TransportActions::for_state(&self.state);
        self.listeners.state_changed(&self.state, actions);
    }
}

/// Report every open/prepare failure as a resource error
fn uniform(err: PlaybackError, locator: &str) -> PlaybackError {
    match err {
        err @ PlaybackError::Resource { .. } => err,
        other => PlaybackError::resource(locator, other),
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.release_resources();
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("state", &self.state)
            .field("focus", &self.focus)
            .field("handle", &self.handle)
            .field("completed", &self.completed)
            .field("pending_seek", &self.pending_seek)
            .field("volume", &self.volume)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
