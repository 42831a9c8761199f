//! Cadence - Playback Control
//!
//! Platform-agnostic playback control core for a media player.
//!
//! This crate provides:
//! - Audio focus arbitration (gain, transient loss, ducking, permanent loss)
//! - Playback engine state machine (Idle/Preparing/Playing/Paused/Stopped)
//! - Play queue with a wrapping cursor
//! - Session controller resolving transport commands against the queue
//! - Single-threaded command service for commands and environment callbacks
//! - Listener interface for presentation layers
//!
//! # Architecture
//!
//! `cadence-playback` does not produce sound and does not talk to any
//! platform audio system. The platform supplies:
//! - an [`OutputResource`] that opens, starts, pauses and releases audio
//! - a [`FocusEnvironment`] that grants and takes back output rights
//! - a [`MetadataProvider`] that resolves item ids to track metadata
//!
//! and reports asynchronous events (completion, focus changes) through an
//! [`EnvironmentNotifier`].
//!
//! # Example: Session
//!
//! ```rust,no_run
//! use cadence_playback::{
//!     ChannelListener, FocusEnvironment, InMemoryLibrary, OutputHandle, OutputResource,
//!     PlaybackConfig, Result, SessionController, SessionService,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Speaker;
//!
//! impl OutputResource for Speaker {
//!     fn open(&mut self, _locator: &str) -> Result<OutputHandle> {
//!         Ok(OutputHandle::new(1))
//!     }
//!     fn start(&mut self, _handle: OutputHandle) {}
//!     fn pause(&mut self, _handle: OutputHandle) {}
//!     fn release(&mut self, _handle: OutputHandle) {}
//!     fn seek(&mut self, _handle: OutputHandle, _position: Duration) {}
//!     fn set_volume(&mut self, _handle: OutputHandle, _left: f32, _right: f32) {}
//!     fn position(&self, _handle: OutputHandle) -> Duration {
//!         Duration::ZERO
//!     }
//! }
//!
//! struct AlwaysGranted;
//!
//! impl FocusEnvironment for AlwaysGranted {
//!     fn request(&mut self) -> bool {
//!         true
//!     }
//!     fn abandon(&mut self) {}
//! }
//!
//! # fn main() -> Result<()> {
//! let mut controller = SessionController::new(
//!     PlaybackConfig::default(),
//!     Box::new(Speaker),
//!     Box::new(AlwaysGranted),
//!     Arc::new(InMemoryLibrary::new()),
//! )?;
//! let (listener, events) = ChannelListener::new();
//! controller.add_listener(Box::new(listener));
//!
//! let session = SessionService::spawn(controller)?;
//! session.play()?;
//! for event in events.try_iter() {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod events;
mod focus;
mod metadata;
mod output;
mod queue;
mod service;
mod session;
pub mod types;

// Public exports
pub use engine::{needs_reload, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::{ChannelListener, PlaybackEvent, PlaybackListener};
pub use focus::{AudioFocusArbiter, FocusChange, FocusDirective, FocusEnvironment, FocusState};
pub use metadata::{InMemoryLibrary, MetadataProvider};
pub use output::{OutputHandle, OutputResource, Readiness};
pub use queue::Queue;
pub use service::{EnvironmentNotifier, SessionCommand, SessionHandle, SessionService};
pub use session::{SessionController, SessionSnapshot};
pub use types::{
    format_position, ItemId, PlayOutcome, PlaybackConfig, PlaybackItem, PlaybackState,
    TrackMetadata, TransportActions,
};
