//! Audio focus arbitration
//!
//! Tracks whether this player currently holds output rights against the other
//! audio producers in the environment, and turns the environment's focus
//! changes into directives the playback engine must obey:
//!
//! ```text
//! Gained                (resume pending) -> Resume
//! Gained                (playing)        -> RestoreVolume
//! TransientLossCanDuck                   -> Duck(level)
//! TransientLoss         (playing)        -> Pause, resume on next Gained
//! PermanentLoss                          -> abandon focus, Stop
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment side of audio focus
///
/// Implemented by the platform glue. `request` must answer quickly; there is
/// no retry, a refusal is final for that request.
#[cfg_attr(test, mockall::automock)]
pub trait FocusEnvironment: Send {
    /// Ask for exclusive output rights, returns whether they were granted
    fn request(&mut self) -> bool;

    /// Give output rights back
    fn abandon(&mut self);
}

/// Focus held by this player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "focus", rename_all = "snake_case")]
pub enum FocusState {
    /// Not holding focus
    #[default]
    None,

    /// Temporarily lost, still registered with the environment
    Transient {
        /// Output was running when focus went away and restarts on regain
        resuming: bool,
    },

    /// Sharing output at reduced volume
    Ducked,

    /// Exclusive output rights
    Gained,
}

impl FocusState {
    /// Whether the environment currently has us registered as a focus holder
    pub fn is_held(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Focus change signalled by the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    Gained,
    TransientLoss,
    TransientLossCanDuck,
    PermanentLoss,
}

/// What the engine has to do after a focus change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusDirective {
    /// Restart output that was paused by a transient loss
    Resume,

    /// Return to the normal output volume
    RestoreVolume,

    /// Lower output volume to the given level, keep playing
    Duck(f32),

    /// Pause output but keep focus registered
    Pause,

    /// Stop output entirely, focus already abandoned
    Stop,
}

/// Audio focus arbiter
///
/// Sole owner of [`FocusState`]. Requests and abandons are forwarded to the
/// [`FocusEnvironment`] only when they change whether focus is held, so every
/// granted request is matched by exactly one abandon.
pub struct AudioFocusArbiter {
    environment: Box<dyn FocusEnvironment>,
    state: FocusState,
    duck_volume: f32,
}

impl AudioFocusArbiter {
    pub fn new(environment: Box<dyn FocusEnvironment>, duck_volume: f32) -> Self {
        Self {
            environment,
            state: FocusState::None,
            duck_volume,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Volume used while ducked
    pub fn duck_volume(&self) -> f32 {
        self.duck_volume
    }

    /// Request exclusive output rights
    ///
    /// Returns true without asking the environment again while focus is
    /// held. A request made during a transient loss takes focus back; a
    /// ducked session stays ducked until the environment restores it.
    pub fn request_focus(&mut self) -> bool {
        match self.state {
            FocusState::Gained | FocusState::Ducked => return true,
            FocusState::Transient { .. } => {
                debug!("Reclaiming audio focus after transient loss");
                self.state = FocusState::Gained;
                return true;
            }
            FocusState::None => {}
        }

        if self.environment.request() {
            debug!(previous = ?self.state, "Audio focus granted");
            self.state = FocusState::Gained;
            true
        } else {
            info!("Audio focus request denied");
            false
        }
    }

    /// Release output rights
    ///
    /// No-op when focus is not held.
    pub fn abandon_focus(&mut self) {
        if self.state.is_held() {
            debug!(previous = ?self.state, "Abandoning audio focus");
            self.environment.abandon();
        }
        self.state = FocusState::None;
    }

    /// Forget a pending auto-resume (the user paused explicitly)
    pub fn clear_resume(&mut self) {
        if let FocusState::Transient { resuming: true } = self.state {
            self.state = FocusState::Transient { resuming: false };
        }
    }

    /// Apply the focus policy to an environment notification
    ///
    /// `active` tells whether output is running (or about to run) right now.
    pub fn on_focus_change(&mut self, change: FocusChange, active: bool) -> Option<FocusDirective> {
        if !self.state.is_held() {
            debug!(?change, "Ignoring focus change while not holding focus");
            return None;
        }

        let previous = self.state;
        let directive = match change {
            FocusChange::Gained => {
                self.state = FocusState::Gained;
                match previous {
                    FocusState::Transient { resuming: true } if !active => {
                        Some(FocusDirective::Resume)
                    }
                    _ if active => Some(FocusDirective::RestoreVolume),
                    _ => None,
                }
            }
            FocusChange::TransientLossCanDuck => {
                self.state = FocusState::Ducked;
                Some(FocusDirective::Duck(self.duck_volume))
            }
            FocusChange::TransientLoss => {
                let resuming =
                    active || matches!(previous, FocusState::Transient { resuming: true });
                self.state = FocusState::Transient { resuming };
                active.then_some(FocusDirective::Pause)
            }
            FocusChange::PermanentLoss => {
                self.environment.abandon();
                self.state = FocusState::None;
                Some(FocusDirective::Stop)
            }
        };

        info!(?change, ?previous, current = ?self.state, ?directive, "Audio focus changed");
        directive
    }
}

impl std::fmt::Debug for AudioFocusArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFocusArbiter")
            .field("state", &self.state)
            .field("duck_volume", &self.duck_volume)
            .finish_non_exhaustive()
    }
}
