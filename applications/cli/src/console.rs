//! Interactive console session
//!
//! Wires the simulated output and focus environment into a playback session
//! and executes typed commands against it.

use crate::{
    clock::{ClockOutput, Ticker},
    command::Command,
    config::CliConfig,
    error::{CliError, Result},
    focus::ConsoleFocus,
    library::to_library,
    render::describe_snapshot,
};
use cadence_playback::{
    ChannelListener, EnvironmentNotifier, ItemId, MetadataProvider, PlaybackEvent,
    SessionController, SessionHandle, SessionService, TrackMetadata,
};
use crossbeam_channel::Receiver;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What the console should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Command posted, nothing to print
    Sent,

    /// Text to print
    Text(String),

    /// Leave the console
    Quit,
}

/// Running session plus the simulated environment around it
pub struct Console {
    session: SessionHandle,
    notifier: EnvironmentNotifier,
    library: Arc<dyn MetadataProvider>,
    ticker: Ticker,
}

impl Console {
    /// Start a session over `tracks`, enqueueing all of them
    ///
    /// Returns the console and the stream of playback events.
    pub fn start(
        config: &CliConfig,
        tracks: &[TrackMetadata],
    ) -> Result<(Self, Receiver<PlaybackEvent>)> {
        let library: Arc<dyn MetadataProvider> = Arc::new(to_library(tracks));
        let output = ClockOutput::new(tracks);

        let mut controller = SessionController::new(
            config.playback.clone(),
            Box::new(output.clone()),
            Box::new(ConsoleFocus::new(config.simulation.grant_focus)),
            Arc::clone(&library),
        )?;
        let (listener, events) = ChannelListener::new();
        controller.add_listener(Box::new(listener));

        let session = SessionService::spawn(controller)?;
        let notifier = session.notifier();
        let ticker = output.spawn_ticker(
            notifier.clone(),
            Duration::from_millis(config.simulation.tick_ms),
        )?;

        for track in tracks {
            session.add_item(track.to_item())?;
        }
        info!(tracks = tracks.len(), "Session started");

        Ok((
            Self {
                session,
                notifier,
                library,
                ticker,
            },
            events,
        ))
    }

    /// Execute one command
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Play => self.session.play()?,
            Command::Pause => self.session.pause()?,
            Command::Stop => self.session.stop()?,
            Command::Next => self.session.skip_to_next()?,
            Command::Previous => self.session.skip_to_previous()?,
            Command::Seek(position) => self.session.seek_to(position)?,
            Command::Volume(volume) => self.session.set_volume(volume)?,
            Command::Prepare => self.session.prepare()?,
            Command::Add(id) => self.session.add_item(self.resolve(&id)?.to_item())?,
            Command::Remove(id) => self.session.remove_item(self.resolve(&id)?.to_item())?,
            Command::Focus(change) => self.notifier.focus_changed(change)?,
            Command::Noisy => self.notifier.audio_becoming_noisy()?,
            Command::Status => {
                let snapshot = self.session.snapshot()?;
                return Ok(Reply::Text(describe_snapshot(&snapshot)));
            }
            Command::Help => return Ok(Reply::Text(Command::USAGE.to_string())),
            Command::Quit => return Ok(Reply::Quit),
        }
        Ok(Reply::Sent)
    }

    /// Read commands from `input` until `quit` or end of input
    pub fn run(&self, input: impl BufRead, mut out: impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let reply = line
                .parse::<Command>()
                .and_then(|command| self.execute(command));
            match reply {
                Ok(Reply::Sent) => {}
                Ok(Reply::Text(text)) => writeln!(out, "{text}")?,
                Ok(Reply::Quit) => break,
                Err(e) => {
                    warn!(error = %e, "Command rejected");
                    writeln!(out, "{e} (type `help` for commands)")?;
                }
            }
        }
        Ok(())
    }

    /// Stop the environment threads and the session
    pub fn shutdown(self) -> Result<()> {
        drop(self.ticker);
        self.session.shutdown()?;
        info!("Session closed");
        Ok(())
    }

    fn resolve(&self, id: &ItemId) -> Result<TrackMetadata> {
        self.library
            .lookup(id)
            .ok_or_else(|| CliError::Library(format!("unknown track: {id}")))
    }
}
