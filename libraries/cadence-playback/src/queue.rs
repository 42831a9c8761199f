//! Play queue with cursor
//!
//! Ordered list of items in insertion order plus a cursor designating the
//! current one:
//!
//! ```text
//! [ A ][ B ][ C ]
//!        ^ cursor = 1
//! ```
//!
//! The cursor is unset exactly when the queue is empty and otherwise always
//! indexes a valid item.

use crate::types::PlaybackItem;

/// Play queue
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<PlaybackItem>,
    cursor: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item
    ///
    /// The first item added to an empty queue becomes current.
    pub fn push(&mut self, item: PlaybackItem) {
        self.items.push(item);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
    }

    /// Remove the first item equal to `item`
    ///
    /// Returns the index it was removed from. The cursor keeps its numeric
    /// value unless it now points past the end, in which case it moves to the
    /// last item.
    pub fn remove(&mut self, item: &PlaybackItem) -> Option<usize> {
        let index = self.items.iter().position(|queued| queued == item)?;
        self.items.remove(index);

        self.cursor = match self.items.len() {
            0 => None,
            len => self.cursor.map(|cursor| cursor.min(len - 1)),
        };

        Some(index)
    }

    pub fn get(&self, index: usize) -> Option<&PlaybackItem> {
        self.items.get(index)
    }

    /// Item under the cursor
    pub fn current(&self) -> Option<&PlaybackItem> {
        self.cursor.and_then(|cursor| self.items.get(cursor))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Move the cursor forward, wrapping to the first item
    pub fn advance(&mut self) -> Option<usize> {
        let len = self.items.len();
        self.cursor = self.cursor.map(|cursor| (cursor + 1) % len);
        self.cursor
    }

    /// Move the cursor back, wrapping to the last item
    pub fn retreat(&mut self) -> Option<usize> {
        let len = self.items.len();
        self.cursor = self
            .cursor
            .map(|cursor| if cursor > 0 { cursor - 1 } else { len - 1 });
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[PlaybackItem] {
        &self.items
    }
}
