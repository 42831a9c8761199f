//! Cadence console front end
//!
//! Drives a playback session from typed transport commands, against a
//! simulated wall-clock output and a TOML track library.

pub mod clock;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod focus;
pub mod library;
pub mod render;

pub use error::{CliError, Result};
