//! Core types for playback control

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::time::Duration;

/// Identifier of a track in the metadata provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A playable entry of the queue
///
/// Immutable once enqueued. Two items are the same queue entry when all
/// three fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackItem {
    /// Track identifier, resolved through the metadata provider
    pub id: ItemId,

    /// Track duration
    pub duration: Duration,

    /// Opaque locator handed to the output resource
    pub locator: String,
}

impl PlaybackItem {
    pub fn new(id: impl Into<ItemId>, duration: Duration, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            duration,
            locator: locator.into(),
        }
    }
}

/// Track metadata returned by a [`MetadataProvider`](crate::MetadataProvider)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: ItemId,
    pub title: String,
    pub artist: String,
    pub album: String,

    /// Genre (optional, not every catalog carries one)
    #[serde(default)]
    pub genre: Option<String>,

    pub duration: Duration,

    /// Locator of the underlying audio resource
    pub locator: String,
}

impl TrackMetadata {
    /// The playable item described by this metadata
    pub fn to_item(&self) -> PlaybackItem {
        PlaybackItem::new(self.id.clone(), self.duration, self.locator.clone())
    }
}

/// Playback state of the engine
///
/// Exactly one instance exists per engine and it only changes through
/// engine operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing has been loaded yet
    #[default]
    Idle,

    /// Item is being opened/prepared by the output resource
    Preparing { item: PlaybackItem },

    /// Output running
    Playing {
        item: PlaybackItem,
        position: Duration,
        rate: f32,
    },

    /// Output halted, resource still held
    Paused { item: PlaybackItem, position: Duration },

    /// Output resource released
    Stopped,
}

impl PlaybackState {
    /// Item the state refers to, if any
    pub fn item(&self) -> Option<&PlaybackItem> {
        match self {
            Self::Preparing { item } | Self::Playing { item, .. } | Self::Paused { item, .. } => {
                Some(item)
            }
            Self::Idle | Self::Stopped => None,
        }
    }

    /// Position reported with the state
    pub fn position(&self) -> Option<Duration> {
        match self {
            Self::Playing { position, .. } | Self::Paused { position, .. } => Some(*position),
            Self::Preparing { .. } => Some(Duration::ZERO),
            Self::Idle | Self::Stopped => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    /// Short name for logs and status lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing { .. } => "preparing",
            Self::Playing { .. } => "playing",
            Self::Paused { .. } => "paused",
            Self::Stopped => "stopped",
        }
    }
}

/// Set of transport actions available in a given state
///
/// Always derived from the state with [`TransportActions::for_state`],
/// never stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportActions(u32);

impl TransportActions {
    pub const NONE: Self = Self(0);
    pub const PLAY: Self = Self(1);
    pub const PAUSE: Self = Self(1 << 1);
    pub const STOP: Self = Self(1 << 2);
    pub const SEEK_TO: Self = Self(1 << 3);
    pub const SKIP_TO_NEXT: Self = Self(1 << 4);
    pub const SKIP_TO_PREVIOUS: Self = Self(1 << 5);
    pub const PLAY_PAUSE: Self = Self(1 << 6);
    pub const PREPARE: Self = Self(1 << 7);

    const NAMES: [(Self, &'static str); 8] = [
        (Self::PLAY, "play"),
        (Self::PAUSE, "pause"),
        (Self::STOP, "stop"),
        (Self::SEEK_TO, "seek"),
        (Self::SKIP_TO_NEXT, "next"),
        (Self::SKIP_TO_PREVIOUS, "previous"),
        (Self::PLAY_PAUSE, "play_pause"),
        (Self::PREPARE, "prepare"),
    ];

    /// Actions offered while in `state`
    pub fn for_state(state: &PlaybackState) -> Self {
        let base = Self::SKIP_TO_NEXT | Self::SKIP_TO_PREVIOUS | Self::PREPARE;
        match state {
            PlaybackState::Idle | PlaybackState::Stopped => base | Self::PLAY,
            PlaybackState::Preparing { .. } => base,
            PlaybackState::Playing { .. } => {
                base | Self::PAUSE | Self::STOP | Self::SEEK_TO | Self::PLAY_PAUSE
            }
            PlaybackState::Paused { .. } => base | Self::PLAY | Self::PLAY_PAUSE,
        }
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the contained actions, in a fixed order
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(action, _)| self.contains(*action))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for TransportActions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What a `play` request ended up doing
///
/// Focus denial and "nothing to play" are not errors; they are reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayOutcome {
    /// Output started, state is `Playing`
    Started,

    /// The requested item was already playing
    AlreadyPlaying,

    /// Output resource is preparing asynchronously, state is `Preparing`
    Preparing,

    /// Focus request refused, state unchanged
    FocusDenied,

    /// Nothing to play (empty queue, unresolvable item)
    Ignored,
}

/// Configuration for the playback core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Output volume while holding full focus (0.0-1.0, default: 1.0)
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    /// Output volume while ducked (0.0-1.0, default: 0.2)
    #[serde(default = "default_duck_volume")]
    pub duck_volume: f32,

    /// Playback speed reported with `Playing` (default: 1.0)
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f32,

    /// Pause when the output route becomes noisy (default: true)
    #[serde(default = "default_pause_on_noisy")]
    pub pause_on_noisy: bool,

    /// Capacity of the session command channel (default: 32)
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

impl PlaybackConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, volume) in [
            ("default_volume", self.default_volume),
            ("duck_volume", self.duck_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(PlaybackError::InvalidConfig(format!(
                    "{name} must be within 0.0-1.0, got {volume}"
                )));
            }
        }

        if !self.playback_rate.is_finite() || self.playback_rate <= 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "playback_rate must be positive, got {}",
                self.playback_rate
            )));
        }

        if self.command_capacity == 0 {
            return Err(PlaybackError::InvalidConfig(
                "command_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            duck_volume: default_duck_volume(),
            playback_rate: default_playback_rate(),
            pause_on_noisy: default_pause_on_noisy(),
            command_capacity: default_command_capacity(),
        }
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_duck_volume() -> f32 {
    0.2
}

fn default_playback_rate() -> f32 {
    1.0
}

fn default_pause_on_noisy() -> bool {
    true
}

fn default_command_capacity() -> usize {
    32
}

/// Render a position as `m:ss`, or `h:mm:ss` past the hour
pub fn format_position(position: Duration) -> String {
    let total = position.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> PlaybackItem {
        PlaybackItem::new(id, Duration::from_secs(30), format!("asset://{id}.mp3"))
    }

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.default_volume, 1.0);
        assert_eq!(config.duck_volume, 0.2);
        assert_eq!(config.playback_rate, 1.0);
        assert!(config.pause_on_noisy);
        assert_eq!(config.command_capacity, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        let config = PlaybackConfig {
            duck_volume: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));

        let config = PlaybackConfig {
            playback_rate: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PlaybackConfig {
            command_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: PlaybackConfig = serde_json::from_str(r#"{"duck_volume": 0.5}"#).unwrap();
        assert_eq!(config.duck_volume, 0.5);
        assert_eq!(config.default_volume, 1.0);
        assert_eq!(config.command_capacity, 32);
    }

    #[test]
    fn pause_only_offered_while_playing() {
        let a = item("a");
        let playing = PlaybackState::Playing {
            item: a.clone(),
            position: Duration::ZERO,
            rate: 1.0,
        };
        let paused = PlaybackState::Paused {
            item: a.clone(),
            position: Duration::ZERO,
        };

        assert!(TransportActions::for_state(&playing).contains(TransportActions::PAUSE));
        assert!(TransportActions::for_state(&playing).contains(TransportActions::SEEK_TO));
        assert!(TransportActions::for_state(&playing).contains(TransportActions::STOP));

        for state in [
            PlaybackState::Idle,
            PlaybackState::Stopped,
            PlaybackState::Preparing { item: a },
            paused,
        ] {
            let actions = TransportActions::for_state(&state);
            assert!(!actions.contains(TransportActions::PAUSE), "{state:?}");
            assert!(!actions.contains(TransportActions::STOP), "{state:?}");
            assert!(!actions.contains(TransportActions::SEEK_TO), "{state:?}");
            assert!(actions.contains(TransportActions::SKIP_TO_NEXT));
        }
    }

    #[test]
    fn action_names_follow_fixed_order() {
        let actions = TransportActions::STOP | TransportActions::PLAY;
        assert_eq!(actions.names(), vec!["play", "stop"]);
        assert!(TransportActions::NONE.names().is_empty());
    }

    #[test]
    fn state_accessors() {
        let a = item("a");
        let paused = PlaybackState::Paused {
            item: a.clone(),
            position: Duration::from_millis(5000),
        };
        assert_eq!(paused.item(), Some(&a));
        assert_eq!(paused.position(), Some(Duration::from_millis(5000)));
        assert_eq!(paused.name(), "paused");
        assert!(!paused.is_playing());
        assert_eq!(PlaybackState::Stopped.item(), None);
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
    }

    #[test]
    fn metadata_converts_to_item() {
        let meta = TrackMetadata {
            id: ItemId::new("Jazz_In_Paris"),
            title: "Jazz in Paris".to_string(),
            artist: "Media Right Productions".to_string(),
            album: "Jazz & Blues".to_string(),
            genre: Some("Jazz".to_string()),
            duration: Duration::from_secs(103),
            locator: "jazz_in_paris.mp3".to_string(),
        };
        let item = meta.to_item();
        assert_eq!(item.id.as_str(), "Jazz_In_Paris");
        assert_eq!(item.duration, Duration::from_secs(103));
        assert_eq!(item.locator, "jazz_in_paris.mp3");
    }

    #[test]
    fn formats_positions() {
        assert_eq!(format_position(Duration::ZERO), "0:00");
        assert_eq!(format_position(Duration::from_millis(103_400)), "1:43");
        assert_eq!(format_position(Duration::from_secs(3725)), "1:02:05");
    }
}
