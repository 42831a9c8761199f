//! Playback Events
//!
//! Outbound notifications for presentation layers (notification, seek bar,
//! queue view). Listeners are called synchronously on the session thread
//! right after each transition, in transition order, without coalescing.
//! They must not block and must not call back into the session.

use crate::types::{PlaybackState, TrackMetadata, TransportActions};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Consumer of playback notifications
pub trait PlaybackListener: Send {
    /// The engine entered `state`; `actions` are the transport actions it offers
    fn on_state_changed(&mut self, state: &PlaybackState, actions: TransportActions);

    /// The current item played to its end
    fn on_completion(&mut self);

    /// The session prepared new current metadata
    fn on_metadata_changed(&mut self, _metadata: &TrackMetadata) {}

    /// Items were added to or removed from the queue
    fn on_queue_changed(&mut self, _length: usize) {}

    /// A command failed on the session thread
    fn on_error(&mut self, _message: &str) {}
}

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged {
        state: PlaybackState,
        actions: TransportActions,
    },

    /// Current item played to its end
    Completion,

    /// Current metadata changed
    MetadataChanged { metadata: TrackMetadata },

    /// Queue changed (items added/removed)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Error occurred while executing a command
    Error { message: String },
}

/// Listener forwarding every notification into a channel
///
/// The channel is unbounded so the session thread never waits on a slow
/// consumer. Events sent after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    event_tx: Sender<PlaybackEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its channel
    pub fn new() -> (Self, Receiver<PlaybackEvent>) {
        let (event_tx, event_rx) = unbounded();
        (Self { event_tx }, event_rx)
    }

    fn send(&self, event: PlaybackEvent) {
        self.event_tx.send(event).ok();
    }
}

impl PlaybackListener for ChannelListener {
    fn on_state_changed(&mut self, state: &PlaybackState, actions: TransportActions) {
        self.send(PlaybackEvent::StateChanged {
            state: state.clone(),
            actions,
        });
    }

    fn on_completion(&mut self) {
        self.send(PlaybackEvent::Completion);
    }

    fn on_metadata_changed(&mut self, metadata: &TrackMetadata) {
        self.send(PlaybackEvent::MetadataChanged {
            metadata: metadata.clone(),
        });
    }

    fn on_queue_changed(&mut self, length: usize) {
        self.send(PlaybackEvent::QueueChanged { length });
    }

    fn on_error(&mut self, message: &str) {
        self.send(PlaybackEvent::Error {
            message: message.to_string(),
        });
    }
}

/// Fan-out over every registered listener
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Vec<Box<dyn PlaybackListener>>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Box<dyn PlaybackListener>) {
        self.inner.push(listener);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn state_changed(&mut self, state: &PlaybackState, actions: TransportActions) {
        for listener in &mut self.inner {
            listener.on_state_changed(state, actions);
        }
    }

    pub(crate) fn completion(&mut self) {
        for listener in &mut self.inner {
            listener.on_completion();
        }
    }

    pub(crate) fn metadata_changed(&mut self, metadata: &TrackMetadata) {
        for listener in &mut self.inner {
            listener.on_metadata_changed(metadata);
        }
    }

    pub(crate) fn queue_changed(&mut self, length: usize) {
        for listener in &mut self.inner {
            listener.on_queue_changed(length);
        }
    }

    pub(crate) fn error(&mut self, message: &str) {
        for listener in &mut self.inner {
            listener.on_error(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaybackItem;
    use std::time::Duration;

    #[test]
    fn channel_listener_forwards_in_order() {
        let (listener, events) = ChannelListener::new();
        let mut listeners = Listeners::default();
        listeners.add(Box::new(listener));

        let item = PlaybackItem::new("a", Duration::from_secs(30), "a.mp3");
        let playing = PlaybackState::Playing {
            item,
            position: Duration::ZERO,
            rate: 1.0,
        };
        let actions = TransportActions::for_state(&playing);

        listeners.state_changed(&playing, actions);
        listeners.completion();
        listeners.queue_changed(2);
        listeners.error("boom");

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                PlaybackEvent::StateChanged {
                    state: playing,
                    actions
                },
                PlaybackEvent::Completion,
                PlaybackEvent::QueueChanged { length: 2 },
                PlaybackEvent::Error {
                    message: "boom".to_string()
                },
            ]
        );
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let (mut listener, events) = ChannelListener::new();
        drop(events);
        listener.on_completion();
    }

    #[test]
    fn events_serialize_with_state_tag() {
        let event = PlaybackEvent::StateChanged {
            state: PlaybackState::Stopped,
            actions: TransportActions::PLAY,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["StateChanged"]["state"]["state"], "stopped");
        assert_eq!(json["StateChanged"]["actions"], 1);
    }
}
