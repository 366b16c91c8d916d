use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One externally chosen entity queued for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEntry {
    pub name: String,
    pub url: String,
}

impl SelectionEntry {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Bounded FIFO of comparison candidates. Adding to a full selection
/// evicts the oldest entry; the length never exceeds the capacity.
#[derive(Debug)]
pub struct Selection {
    entries: VecDeque<SelectionEntry>,
    capacity: usize,
}

impl Selection {
    /// Capacity is clamped to the supported 2..=3 range.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.clamp(2, 3),
        }
    }

    /// Append an entry, returning the evicted one when full.
    pub fn add(&mut self, entry: SelectionEntry) -> Option<SelectionEntry> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> Vec<SelectionEntry> {
        self.entries.iter().cloned().collect()
    }
}
