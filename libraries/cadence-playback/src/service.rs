//! Session service
//!
//! Runs a [`SessionController`] on a dedicated thread and feeds it from one
//! command channel. Transport commands from callers and notifications from
//! the environment (focus changes, output callbacks) all go through that
//! channel, so no two transitions ever run concurrently.

use crate::{
    error::{PlaybackError, Result},
    focus::FocusChange,
    output::OutputHandle,
    session::{SessionController, SessionSnapshot},
    types::PlaybackItem,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Commands processed by the session thread
#[derive(Debug)]
pub enum SessionCommand {
    /// Play the item under the cursor
    Play,

    /// Pause playback
    Pause,

    /// Stop playback
    Stop,

    /// Seek within the current item
    SeekTo(Duration),

    /// Skip to next item
    SkipToNext,

    /// Go to previous item
    SkipToPrevious,

    /// Append item to queue
    AddItem(PlaybackItem),

    /// Remove item from queue
    RemoveItem(PlaybackItem),

    /// Resolve metadata for the item under the cursor
    Prepare,

    /// Set volume (0.0-1.0)
    SetVolume(f32),

    /// Environment changed our audio focus
    FocusChanged(FocusChange),

    /// Output resource finished background preparation
    OutputPrepared(OutputHandle),

    /// Output resource failed background preparation
    OutputFailed { handle: OutputHandle, reason: String },

    /// Output resource played to the end
    OutputCompleted(OutputHandle),

    /// Output route became noisy
    AudioBecomingNoisy,

    /// Reply with a snapshot of the session
    Snapshot(Sender<SessionSnapshot>),

    /// Stop the session thread
    Shutdown,
}

/// Spawns session threads
pub struct SessionService;

impl SessionService {
    /// Move `controller` onto its own thread
    pub fn spawn(controller: SessionController) -> Result<SessionHandle> {
        let capacity = controller.engine().config().command_capacity;
        let (command_tx, command_rx) = bounded(capacity);

        let thread = thread::Builder::new()
            .name("cadence-session".to_string())
            .spawn(move || run(controller, &command_rx))?;

        Ok(SessionHandle {
            command_tx,
            thread: Some(thread),
        })
    }
}

/// Handle to a running session
///
/// Dropping the handle shuts the session down.
#[derive(Debug)]
pub struct SessionHandle {
    command_tx: Sender<SessionCommand>,
    thread: Option<JoinHandle<SessionController>>,
}

impl SessionHandle {
    /// Send command to the session thread
    ///
    /// Blocks while the command channel is full.
    pub fn send_command(&self, command: SessionCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub fn play(&self) -> Result<()> {
        self.send_command(SessionCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send_command(SessionCommand::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send_command(SessionCommand::Stop)
    }

    pub fn seek_to(&self, position: Duration) -> Result<()> {
        self.send_command(SessionCommand::SeekTo(position))
    }

    pub fn skip_to_next(&self) -> Result<()> {
        self.send_command(SessionCommand::SkipToNext)
    }

    pub fn skip_to_previous(&self) -> Result<()> {
        self.send_command(SessionCommand::SkipToPrevious)
    }

    pub fn add_item(&self, item: PlaybackItem) -> Result<()> {
        self.send_command(SessionCommand::AddItem(item))
    }

    pub fn remove_item(&self, item: PlaybackItem) -> Result<()> {
        self.send_command(SessionCommand::RemoveItem(item))
    }

    pub fn prepare(&self) -> Result<()> {
        self.send_command(SessionCommand::Prepare)
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send_command(SessionCommand::SetVolume(volume))
    }

    /// Snapshot taken after every previously sent command has run
    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send_command(SessionCommand::Snapshot(reply_tx))?;
        reply_rx.recv().map_err(|_| PlaybackError::SessionClosed)
    }

    /// Notifier for environment callbacks
    pub fn notifier(&self) -> EnvironmentNotifier {
        EnvironmentNotifier {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Stop the session thread and take the controller back
    pub fn shutdown(mut self) -> Result<SessionController> {
        self.send_command(SessionCommand::Shutdown)?;
        let thread = self.thread.take().ok_or(PlaybackError::SessionClosed)?;
        thread.join().map_err(|_| PlaybackError::SessionClosed)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.command_tx.send(SessionCommand::Shutdown).ok();
            if thread.join().is_err() {
                warn!("Playback session thread panicked");
            }
        }
    }
}

/// Posts environment notifications into a session
///
/// Must not be called from inside [`OutputResource`](crate::OutputResource)
/// or [`FocusEnvironment`](crate::FocusEnvironment) methods, which run on the
/// session thread itself.
#[derive(Debug, Clone)]
pub struct EnvironmentNotifier {
    command_tx: Sender<SessionCommand>,
}

impl EnvironmentNotifier {
    pub fn focus_changed(&self, change: FocusChange) -> Result<()> {
        self.send(SessionCommand::FocusChanged(change))
    }

    pub fn output_completed(&self, handle: OutputHandle) -> Result<()> {
        self.send(SessionCommand::OutputCompleted(handle))
    }

    pub fn output_prepared(&self, handle: OutputHandle) -> Result<()> {
        self.send(SessionCommand::OutputPrepared(handle))
    }

    pub fn output_failed(&self, handle: OutputHandle, reason: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::OutputFailed {
            handle,
            reason: reason.into(),
        })
    }

    pub fn audio_becoming_noisy(&self) -> Result<()> {
        self.send(SessionCommand::AudioBecomingNoisy)
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| PlaybackError::SessionClosed)
    }
}

fn run(
    mut controller: SessionController,
    command_rx: &Receiver<SessionCommand>,
) -> SessionController {
    info!("Playback session started");

    for command in command_rx {
        if let SessionCommand::Shutdown = command {
            break;
        }
        if let Err(e) = process_command(&mut controller, command) {
            warn!(error = %e, "Playback command failed");
            controller.report_error(&e.to_string());
        }
    }

    info!("Playback session stopped");
    controller
}

fn process_command(controller: &mut SessionController, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Play => {
            let outcome = controller.play()?;
            debug!(?outcome, "Play");
        }
        SessionCommand::Pause => controller.pause(),
        SessionCommand::Stop => controller.stop(),
        SessionCommand::SeekTo(position) => controller.seek_to(position),
        SessionCommand::SkipToNext => {
            let outcome = controller.skip_to_next()?;
            debug!(?outcome, "Skip to next");
        }
        SessionCommand::SkipToPrevious => {
            let outcome = controller.skip_to_previous()?;
            debug!(?outcome, "Skip to previous");
        }
        SessionCommand::AddItem(item) => controller.add_item(item),
        SessionCommand::RemoveItem(item) => {
            controller.remove_item(&item);
        }
        SessionCommand::Prepare => controller.prepare(),
        SessionCommand::SetVolume(volume) => controller.set_volume(volume),
        SessionCommand::FocusChanged(change) => controller.on_focus_change(change),
        SessionCommand::OutputPrepared(handle) => controller.on_output_prepared(handle),
        SessionCommand::OutputFailed { handle, reason } => {
            controller.on_output_failed(handle, &reason)?;
        }
        SessionCommand::OutputCompleted(handle) => controller.on_output_completed(handle),
        SessionCommand::AudioBecomingNoisy => controller.on_audio_becoming_noisy(),
        SessionCommand::Snapshot(reply_tx) => {
            reply_tx.send(controller.snapshot()).ok();
        }
        SessionCommand::Shutdown => {}
    }
    Ok(())
}
