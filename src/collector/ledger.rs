//! Run-scoped ledger of review ids already collected.

use std::collections::HashSet;

/// Tracks which review ids have been seen across all stars and pages of
/// one run. Never shrinks while the run lives; a new run gets a fresh
/// ledger.
#[derive(Debug, Default)]
pub struct SeenLedger {
    seen: HashSet<String>,
    duplicates: u64,
}

impl SeenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an id. Returns `true` when it had not been seen before.
    pub fn record(&mut self, review_id: &str) -> bool {
        let is_new = self.seen.insert(review_id.to_string());
        if !is_new {
            self.duplicates += 1;
        }
        is_new
    }

    /// Whether the id has already been recorded.
    pub fn contains(&self, review_id: &str) -> bool {
        self.seen.contains(review_id)
    }

    /// Number of distinct ids recorded so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Total duplicate sightings across the run.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }
}
