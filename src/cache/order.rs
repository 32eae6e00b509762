//! Creation Order Module
//!
//! Tracks entries by creation sequence for oldest-first eviction.

use std::collections::BTreeMap;

// == Creation Order ==
/// Index from creation sequence number to normalized key.
///
/// Sequence numbers are strictly increasing, so the first entry of the map is
/// always the oldest-created key. Reads never reorder the index.
#[derive(Debug, Default)]
pub struct CreationOrder {
    by_seq: BTreeMap<u64, String>,
}

impl CreationOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            by_seq: BTreeMap::new(),
        }
    }

    // == Record ==
    /// Records `key` as created at `seq`.
    pub fn record(&mut self, seq: u64, key: &str) {
        self.by_seq.insert(seq, key.to_string());
    }

    // == Remove ==
    /// Forgets the record at `seq`. No-op if absent.
    pub fn remove(&mut self, seq: u64) {
        self.by_seq.remove(&seq);
    }

    // == Oldest ==
    /// Returns the oldest-created key without removing it.
    pub fn oldest(&self) -> Option<&str> {
        self.by_seq.values().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_seq.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_seq.clear();
    }
}
