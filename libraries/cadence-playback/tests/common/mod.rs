//! Shared test doubles for the integration tests

#![allow(dead_code)]

use cadence_playback::{
    FocusEnvironment, InMemoryLibrary, ItemId, OutputHandle, OutputResource, PlaybackConfig,
    PlaybackError, PlaybackEvent, PlaybackListener, PlaybackState, Readiness, Result,
    SessionController, TrackMetadata, TransportActions,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// ============================================================================
// Output resource
// ============================================================================

/// Everything the engine asked the output resource to do
#[derive(Debug, Default)]
pub struct OutputLog {
    next_handle: u64,
    pub opened: Vec<(OutputHandle, String)>,
    pub started: Vec<OutputHandle>,
    pub paused: Vec<OutputHandle>,
    pub released: Vec<OutputHandle>,
    pub seeks: Vec<(OutputHandle, Duration)>,
    pub volumes: Vec<(OutputHandle, f32, f32)>,
    pub positions: HashMap<OutputHandle, Duration>,

    /// Locators that fail to open
    pub broken: HashSet<String>,

    /// Prepare asynchronously instead of reporting ready at once
    pub deferred_prepare: bool,
}

/// Output resource recording every call
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    log: Arc<Mutex<OutputLog>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred() -> Self {
        let output = Self::default();
        output.log().deferred_prepare = true;
        output
    }

    pub fn log(&self) -> MutexGuard<'_, OutputLog> {
        self.log.lock().unwrap()
    }

    pub fn break_locator(&self, locator: &str) {
        self.log().broken.insert(locator.to_string());
    }

    /// Pretend `handle` has rendered up to `position`
    pub fn render_to(&self, handle: OutputHandle, position: Duration) {
        self.log().positions.insert(handle, position);
    }

    pub fn open_count(&self) -> usize {
        self.log().opened.len()
    }

    pub fn last_handle(&self) -> OutputHandle {
        self.log().opened.last().unwrap().0
    }
}

impl OutputResource for RecordingOutput {
    fn open(&mut self, locator: &str) -> Result<OutputHandle> {
        let mut log = self.log();
        if log.broken.contains(locator) {
            return Err(PlaybackError::resource(locator, "no such file"));
        }
        log.next_handle += 1;
        let handle = OutputHandle::new(log.next_handle);
        log.opened.push((handle, locator.to_string()));
        log.positions.insert(handle, Duration::ZERO);
        Ok(handle)
    }

    fn prepare(&mut self, _handle: OutputHandle) -> Result<Readiness> {
        if self.log().deferred_prepare {
            Ok(Readiness::Pending)
        } else {
            Ok(Readiness::Ready)
        }
    }

    fn start(&mut self, handle: OutputHandle) {
        self.log().started.push(handle);
    }

    fn pause(&mut self, handle: OutputHandle) {
        self.log().paused.push(handle);
    }

    fn release(&mut self, handle: OutputHandle) {
        self.log().released.push(handle);
    }

    fn seek(&mut self, handle: OutputHandle, position: Duration) {
        let mut log = self.log();
        log.seeks.push((handle, position));
        log.positions.insert(handle, position);
    }

    fn set_volume(&mut self, handle: OutputHandle, left: f32, right: f32) {
        self.log().volumes.push((handle, left, right));
    }

    fn position(&self, handle: OutputHandle) -> Duration {
        self.log().positions.get(&handle).copied().unwrap_or_default()
    }
}

// ============================================================================
// Focus environment
// ============================================================================

#[derive(Debug, Default)]
pub struct FocusLog {
    pub deny: bool,
    pub requests: usize,
    pub grants: usize,
    pub abandons: usize,
}

/// Focus environment that grants unless told to deny
#[derive(Debug, Clone, Default)]
pub struct ScriptedFocus {
    log: Arc<Mutex<FocusLog>>,
}

impl ScriptedFocus {
    pub fn granting() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        let focus = Self::default();
        focus.log().deny = true;
        focus
    }

    pub fn log(&self) -> MutexGuard<'_, FocusLog> {
        self.log.lock().unwrap()
    }
}

impl FocusEnvironment for ScriptedFocus {
    fn request(&mut self) -> bool {
        let mut log = self.log();
        log.requests += 1;
        if log.deny {
            false
        } else {
            log.grants += 1;
            true
        }
    }

    fn abandon(&mut self) {
        self.log().abandons += 1;
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Listener keeping every notification in order
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
}

impl RecordingListener {
    pub fn take(&self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// States reported since the last `take`, dropping other events
    pub fn take_states(&self) -> Vec<PlaybackState> {
        self.take()
            .into_iter()
            .filter_map(|event| match event {
                PlaybackEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackListener for RecordingListener {
    fn on_state_changed(&mut self, state: &PlaybackState, actions: TransportActions) {
        assert_eq!(actions, TransportActions::for_state(state), "stale actions");
        self.events.lock().unwrap().push(PlaybackEvent::StateChanged {
            state: state.clone(),
            actions,
        });
    }

    fn on_completion(&mut self) {
        self.events.lock().unwrap().push(PlaybackEvent::Completion);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn track(id: &str, millis: u64) -> TrackMetadata {
    TrackMetadata {
        id: ItemId::new(id),
        title: format!("Track {id}"),
        artist: "Test Artist".to_string(),
        album: "Test Album".to_string(),
        genre: None,
        duration: Duration::from_millis(millis),
        locator: format!("asset://{id}.mp3"),
    }
}

pub fn playing(track: &TrackMetadata, millis: u64) -> PlaybackState {
    PlaybackState::Playing {
        item: track.to_item(),
        position: Duration::from_millis(millis),
        rate: 1.0,
    }
}

pub fn paused(track: &TrackMetadata, millis: u64) -> PlaybackState {
    PlaybackState::Paused {
        item: track.to_item(),
        position: Duration::from_millis(millis),
    }
}

/// Session holding the test doubles
pub struct Harness {
    pub session: SessionController,
    pub output: RecordingOutput,
    pub focus: ScriptedFocus,
    pub listener: RecordingListener,
}

impl Harness {
    /// Session with every track enqueued in order
    pub fn with_tracks(tracks: &[TrackMetadata]) -> Self {
        Self::build(RecordingOutput::new(), ScriptedFocus::granting(), tracks)
    }

    pub fn build(output: RecordingOutput, focus: ScriptedFocus, tracks: &[TrackMetadata]) -> Self {
        let library = InMemoryLibrary::with_tracks(tracks.iter().cloned());
        let mut session = SessionController::new(
            PlaybackConfig::default(),
            Box::new(output.clone()),
            Box::new(focus.clone()),
            Arc::new(library),
        )
        .unwrap();

        let listener = RecordingListener::default();
        session.add_listener(Box::new(listener.clone()));
        for track in tracks {
            session.add_item(track.to_item());
        }

        Self {
            session,
            output,
            focus,
            listener,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        self.session.engine().state()
    }
}
