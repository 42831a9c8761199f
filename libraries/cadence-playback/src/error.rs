//! Error types for playback control

use thiserror::Error;

/// Playback errors
///
/// Only conditions the caller must react to are errors. Transport commands
/// that do not apply to the current state (pause while stopped, seek with
/// nothing loaded, skip on an empty queue) are silent no-ops instead.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The output resource could not open or prepare an item
    ///
    /// Every open/prepare failure is reported through this one variant,
    /// whatever the underlying cause.
    #[error("Failed to open {locator}: {reason}")]
    Resource { locator: String, reason: String },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The session actor has shut down and no longer accepts commands
    #[error("Playback session is closed")]
    SessionClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Build a resource error for `locator`
    pub fn resource(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Resource {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
