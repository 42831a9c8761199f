//! Session controller
//!
//! Owns the play queue and the playback engine, and resolves transport
//! commands against the queue cursor. This is the only mutator of queue and
//! playback state; run it behind [`SessionService`](crate::SessionService)
//! when commands and environment callbacks come from several threads.

use crate::{
    engine::PlaybackEngine,
    error::Result,
    events::PlaybackListener,
    focus::{FocusChange, FocusEnvironment, FocusState},
    metadata::MetadataProvider,
    output::{OutputHandle, OutputResource},
    queue::Queue,
    types::{
        PlayOutcome, PlaybackConfig, PlaybackItem, PlaybackState, TrackMetadata, TransportActions,
    },
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub actions: TransportActions,
    pub focus: FocusState,
    pub queue: Vec<PlaybackItem>,
    pub cursor: Option<usize>,

    /// Metadata of the prepared item
    pub current: Option<TrackMetadata>,

    pub position: Duration,
    pub active: bool,
}

/// Queue-driven transport control
pub struct SessionController {
    queue: Queue,
    engine: PlaybackEngine,
    provider: Arc<dyn MetadataProvider>,

    // Metadata resolved for the item under the cursor
    prepared: Option<TrackMetadata>,
    active: bool,
}

impl SessionController {
    /// Create a session over an empty queue
    pub fn new(
        config: PlaybackConfig,
        output: Box<dyn OutputResource>,
        focus: Box<dyn FocusEnvironment>,
        provider: Arc<dyn MetadataProvider>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            queue: Queue::new(),
            engine: PlaybackEngine::new(config, output, focus),
            provider,
            prepared: None,
            active: false,
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn PlaybackListener>) {
        self.engine.add_listener(listener);
    }

    // ===== Queue Management =====

    /// Append `item` to the queue
    pub fn add_item(&mut self, item: PlaybackItem) {
        debug!(item = %item.id, "Adding item to queue");
        self.queue.push(item);
        self.engine.listeners_mut().queue_changed(self.queue.len());
    }

    /// Remove the first queue entry equal to `item`
    ///
    /// Returns whether an entry was removed. Playback of the removed item is
    /// not interrupted.
    pub fn remove_item(&mut self, item: &PlaybackItem) -> bool {
        let before = self.queue.current().cloned();
        if self.queue.remove(item).is_none() {
            debug!(item = %item.id, "Item not in queue");
            return false;
        }

        if self.queue.current() != before.as_ref() {
            self.prepared = None;
        }
        self.engine.listeners_mut().queue_changed(self.queue.len());
        true
    }

    // ===== Transport Commands =====

    /// Resolve metadata for the item under the cursor and activate the
    /// session
    ///
    /// No-op on an empty queue or an id unknown to the metadata provider.
    pub fn prepare(&mut self) {
        let Some(item) = self.queue.current() else {
            debug!("Nothing to prepare, queue is empty");
            return;
        };

        let Some(metadata) = self.provider.lookup(&item.id) else {
            warn!(item = %item.id, "No metadata for queued item");
            return;
        };

        info!(item = %metadata.id, title = %metadata.title, "Prepared item");
        self.active = true;
        self.engine.listeners_mut().metadata_changed(&metadata);
        self.prepared = Some(metadata);
    }

    /// Play the item under the cursor, preparing it first if needed
    pub fn play(&mut self) -> Result<PlayOutcome> {
        let Some(item) = self.prepared_item() else {
            return Ok(PlayOutcome::Ignored);
        };
        self.engine.play(&item)
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    /// Stop playback and deactivate the session
    pub fn stop(&mut self) {
        self.engine.stop();
        self.active = false;
    }

    pub fn seek_to(&mut self, position: Duration) {
        self.engine.seek_to(position);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume);
    }

    /// Move to the next item, wrapping at the end, and play it from the start
    pub fn skip_to_next(&mut self) -> Result<PlayOutcome> {
        if self.queue.advance().is_none() {
            return Ok(PlayOutcome::Ignored);
        }
        self.replay()
    }

    /// Move to the previous item, wrapping at the start, and play it from the
    /// start
    pub fn skip_to_previous(&mut self) -> Result<PlayOutcome> {
        if self.queue.retreat().is_none() {
            return Ok(PlayOutcome::Ignored);
        }
        self.replay()
    }

    // ===== Environment Notifications =====

    pub fn on_focus_change(&mut self, change: FocusChange) {
        self.engine.on_focus_change(change);
    }

    pub fn on_output_completed(&mut self, handle: OutputHandle) {
        self.engine.on_natural_completion(handle);
    }

    pub fn on_output_prepared(&mut self, handle: OutputHandle) {
        self.engine.on_prepared(handle);
    }

    pub fn on_output_failed(&mut self, handle: OutputHandle, reason: &str) -> Result<()> {
        self.engine.on_prepare_failed(handle, reason)
    }

    pub fn on_audio_becoming_noisy(&mut self) {
        self.engine.on_audio_becoming_noisy();
    }

    /// Tell listeners a command failed
    pub fn report_error(&mut self, message: &str) {
        self.engine.listeners_mut().error(message);
    }

    // ===== Queries =====

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.engine.state().clone(),
            actions: self.engine.actions(),
            focus: self.engine.focus_state(),
            queue: self.queue.items().to_vec(),
            cursor: self.queue.cursor(),
            current: self.prepared.clone(),
            position: self.engine.position(),
            active: self.active,
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn current_metadata(&self) -> Option<&TrackMetadata> {
        self.prepared.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    // ===== Internals =====

    fn prepared_item(&mut self) -> Option<PlaybackItem> {
        if self.queue.is_empty() {
            debug!("Ignoring play, queue is empty");
            return None;
        }
        if self.prepared.is_none() {
            self.prepare();
        }
        self.prepared.as_ref().map(TrackMetadata::to_item)
    }

    fn replay(&mut self) -> Result<PlayOutcome> {
        self.prepared = None;
        let Some(item) = self.prepared_item() else {
            return Ok(PlayOutcome::Ignored);
        };
        self.engine.restart(&item)
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("queue", &self.queue)
            .field("engine", &self.engine)
            .field("prepared", &self.prepared)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
