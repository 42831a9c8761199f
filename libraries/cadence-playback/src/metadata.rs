//! Metadata provider
//!
//! Resolves item identifiers to track metadata. Injected into the session
//! controller; the core never caches what it returns.

use crate::types::{ItemId, TrackMetadata};
use std::collections::BTreeMap;

/// Read-only track catalog
pub trait MetadataProvider: Send + Sync {
    /// Metadata for `id`, `None` if unknown
    fn lookup(&self, id: &ItemId) -> Option<TrackMetadata>;

    /// Every known track, ordered by id
    fn items(&self) -> Vec<TrackMetadata>;
}

/// Catalog held in memory, keyed by id
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibrary {
    tracks: BTreeMap<ItemId, TrackMetadata>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: impl IntoIterator<Item = TrackMetadata>) -> Self {
        tracks.into_iter().collect()
    }

    /// Add or replace a track, returns the replaced entry
    pub fn insert(&mut self, track: TrackMetadata) -> Option<TrackMetadata> {
        self.tracks.insert(track.id.clone(), track)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl FromIterator<TrackMetadata> for InMemoryLibrary {
    fn from_iter<I: IntoIterator<Item = TrackMetadata>>(iter: I) -> Self {
        Self {
            tracks: iter
                .into_iter()
                .map(|track| (track.id.clone(), track))
                .collect(),
        }
    }
}

impl MetadataProvider for InMemoryLibrary {
    fn lookup(&self, id: &ItemId) -> Option<TrackMetadata> {
        self.tracks.get(id).cloned()
    }

    fn items(&self) -> Vec<TrackMetadata> {
        self.tracks.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn track(id: &str, title: &str) -> TrackMetadata {
        TrackMetadata {
            id: ItemId::new(id),
            title: title.to_string(),
            artist: "Kevin MacLeod".to_string(),
            album: "Cinematic".to_string(),
            genre: None,
            duration: Duration::from_secs(90),
            locator: format!("{id}.mp3"),
        }
    }

    #[test]
    fn lookup_known_and_unknown() {
        let library = InMemoryLibrary::with_tracks([track(
            "the_coldest_shoulder",
            "The Coldest Shoulder",
        )]);

        let found = library.lookup(&ItemId::new("the_coldest_shoulder")).unwrap();
        assert_eq!(found.title, "The Coldest Shoulder");
        assert!(library.lookup(&ItemId::new("missing")).is_none());
    }

    #[test]
    fn items_are_ordered_by_id() {
        let library = InMemoryLibrary::with_tracks([track("b", "Second"), track("a", "First")]);
        let ids: Vec<_> = library.items().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![ItemId::new("a"), ItemId::new("b")]);
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let mut library = InMemoryLibrary::new();
        assert!(library.insert(track("a", "Old")).is_none());
        let replaced = library.insert(track("a", "New")).unwrap();

        assert_eq!(replaced.title, "Old");
        assert_eq!(library.len(), 1);
        assert!(!library.is_empty());
    }
}
