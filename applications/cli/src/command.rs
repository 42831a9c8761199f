//! Console command parsing

use crate::error::{CliError, Result};
use cadence_playback::{FocusChange, ItemId};
use std::str::FromStr;
use std::time::Duration;

/// One line typed at the console
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    Seek(Duration),
    Volume(f32),
    Prepare,
    Add(ItemId),
    Remove(ItemId),
    Focus(FocusChange),
    Noisy,
    Status,
    Help,
    Quit,
}

impl Command {
    pub const USAGE: &'static str = "\
commands:
  play | pause | stop | next | prev | prepare
  seek <ms>          move the playhead
  volume <0..1>      set output volume
  add <id>           append a library track to the queue
  remove <id>        remove a track from the queue
  focus <gain|transient|duck|loss>
  noisy              simulate headphones being unplugged
  status | help | quit";
}

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();
        if words.next().is_some() {
            return Err(CliError::Command(line.trim().to_string()));
        }

        let invalid = || CliError::Command(line.trim().to_string());
        let required = || argument.ok_or_else(invalid);

        let command = match (name.as_str(), argument) {
            ("play", None) => Self::Play,
            ("pause", None) => Self::Pause,
            ("stop", None) => Self::Stop,
            ("next", None) => Self::Next,
            ("prev" | "previous", None) => Self::Previous,
            ("prepare", None) => Self::Prepare,
            ("noisy", None) => Self::Noisy,
            ("status", None) => Self::Status,
            ("help", None) => Self::Help,
            ("quit" | "exit", None) => Self::Quit,
            ("seek", _) => {
                let millis: u64 = required()?.parse().map_err(|_| invalid())?;
                Self::Seek(Duration::from_millis(millis))
            }
            ("volume", _) => {
                let volume: f32 = required()?.parse().map_err(|_| invalid())?;
                if !(0.0..=1.0).contains(&volume) {
                    return Err(invalid());
                }
                Self::Volume(volume)
            }
            ("add", _) => Self::Add(ItemId::new(required()?)),
            ("remove", _) => Self::Remove(ItemId::new(required()?)),
            ("focus", _) => Self::Focus(match required()? {
                "gain" => FocusChange::Gained,
                "transient" => FocusChange::TransientLoss,
                "duck" => FocusChange::TransientLossCanDuck,
                "loss" => FocusChange::PermanentLoss,
                _ => return Err(invalid()),
            }),
            _ => return Err(invalid()),
        };

        Ok(command)
    }
}
