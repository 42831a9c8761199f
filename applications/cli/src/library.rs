//! Library file loading
//!
//! A library file is TOML with one `[[tracks]]` table per track:
//!
//! ```toml
//! [[tracks]]
//! id = "jazz_in_paris"
//! title = "Jazz in Paris"
//! artist = "Media Right Productions"
//! album = "Jazz & Blues"
//! genre = "Jazz"
//! duration_ms = 103000
//! locator = "asset://jazz_in_paris.mp3"
//! ```

use crate::error::{CliError, Result};
use cadence_playback::{InMemoryLibrary, ItemId, TrackMetadata};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    tracks: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
struct TrackEntry {
    id: String,
    title: String,
    artist: String,
    #[serde(default)]
    album: String,
    genre: Option<String>,
    duration_ms: u64,
    locator: String,
}

impl From<TrackEntry> for TrackMetadata {
    fn from(entry: TrackEntry) -> Self {
        Self {
            id: ItemId::new(entry.id),
            title: entry.title,
            artist: entry.artist,
            album: entry.album,
            genre: entry.genre,
            duration: Duration::from_millis(entry.duration_ms),
            locator: entry.locator,
        }
    }
}

/// Parse library tracks in file order
pub fn parse_tracks(contents: &str) -> Result<Vec<TrackMetadata>> {
    let file: LibraryFile =
        toml::from_str(contents).map_err(|e| CliError::Library(e.to_string()))?;

    let mut seen = HashSet::new();
    for entry in &file.tracks {
        if !seen.insert(entry.id.as_str()) {
            return Err(CliError::Library(format!("duplicate track id: {}", entry.id)));
        }
        if entry.duration_ms == 0 {
            return Err(CliError::Library(format!(
                "track {} has zero duration",
                entry.id
            )));
        }
    }

    Ok(file.tracks.into_iter().map(TrackMetadata::from).collect())
}

/// Read library tracks from `path`
pub fn load_tracks(path: &Path) -> Result<Vec<TrackMetadata>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CliError::Library(format!("{}: {e}", path.display())))?;
    let tracks = parse_tracks(&contents)?;
    tracing::debug!(path = %path.display(), count = tracks.len(), "Loaded library");
    Ok(tracks)
}

/// Build the metadata provider for `tracks`
pub fn to_library(tracks: &[TrackMetadata]) -> InMemoryLibrary {
    InMemoryLibrary::with_tracks(tracks.iter().cloned())
}
